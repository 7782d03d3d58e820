//! # Packet Types
//!
//! Structured representation of one protocol message: header, payload, and
//! the type/status enumerations shared by both peers.
//!
//! Every exchange with an MHUX server is carried in packets. A packet is
//! immutable once serialized; its sequence number is assigned by the owning
//! session at send time, never by the caller.

use std::borrow::Cow;

/// Protocol family identifier, ASCII "MHUX".
pub const MAGIC: u32 = 0x4D48_5558;

/// Supported protocol version (1.0).
pub const PROTOCOL_VERSION: u16 = 0x0100;

/// Fixed header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Checksum trailer size in bytes.
pub const TRAILER_SIZE: usize = 4;

/// Smallest possible packet: header plus trailer, empty payload.
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + TRAILER_SIZE;

/// Largest packet accepted on the wire.
pub const MAX_PACKET_SIZE: usize = 64 * 1024;

/// Largest payload that fits inside [`MAX_PACKET_SIZE`].
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - MIN_PACKET_SIZE;

/// What a packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum PacketType {
    /// Query request
    Query = 0x0001,
    /// Query response
    Response = 0x0002,
    /// Error response
    Error = 0x0003,
    /// Heartbeat probe
    Heartbeat = 0x0004,
    /// Authentication request
    Auth = 0x0005,
    /// Authentication response
    AuthResponse = 0x0006,
    /// Graceful disconnect
    Disconnect = 0x0007,
    /// Keepalive
    Keepalive = 0x0008,
}

impl PacketType {
    /// Map a wire value back to a known type, if any.
    pub fn from_wire(raw: u16) -> Option<Self> {
        match raw {
            0x0001 => Some(Self::Query),
            0x0002 => Some(Self::Response),
            0x0003 => Some(Self::Error),
            0x0004 => Some(Self::Heartbeat),
            0x0005 => Some(Self::Auth),
            0x0006 => Some(Self::AuthResponse),
            0x0007 => Some(Self::Disconnect),
            0x0008 => Some(Self::Keepalive),
            _ => None,
        }
    }

    /// Human-readable name for logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Response => "response",
            Self::Error => "error",
            Self::Heartbeat => "heartbeat",
            Self::Auth => "auth",
            Self::AuthResponse => "auth-response",
            Self::Disconnect => "disconnect",
            Self::Keepalive => "keepalive",
        }
    }
}

/// Outcome or disposition attached to a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum PacketStatus {
    Ok = 0x0000,
    Error = 0x0001,
    Pending = 0x0002,
    Timeout = 0x0003,
    AuthFailed = 0x0004,
    PermissionDenied = 0x0005,
    InvalidQuery = 0x0006,
    ServerError = 0x0007,
}

impl PacketStatus {
    /// Map a wire value back to a known status, if any.
    pub fn from_wire(raw: u16) -> Option<Self> {
        match raw {
            0x0000 => Some(Self::Ok),
            0x0001 => Some(Self::Error),
            0x0002 => Some(Self::Pending),
            0x0003 => Some(Self::Timeout),
            0x0004 => Some(Self::AuthFailed),
            0x0005 => Some(Self::PermissionDenied),
            0x0006 => Some(Self::InvalidQuery),
            0x0007 => Some(Self::ServerError),
            _ => None,
        }
    }

    /// Human-readable name for logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Pending => "pending",
            Self::Timeout => "timeout",
            Self::AuthFailed => "auth-failed",
            Self::PermissionDenied => "permission-denied",
            Self::InvalidQuery => "invalid-query",
            Self::ServerError => "server-error",
        }
    }
}

/// Fixed 16-byte packet header, all fields big-endian on the wire.
///
/// Type and status are kept as raw wire values so an unknown value from a
/// newer peer survives a round trip; use [`Packet::packet_type`] and
/// [`Packet::status`] for the typed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u16,
    pub packet_type: u16,
    pub status: u16,
    pub sequence: u32,
    pub data_length: u16,
}

/// One complete protocol message: verified header plus payload.
///
/// Produced by [`crate::core::codec::PacketCodec::decode`]; the checksum has
/// already been verified by the time a `Packet` exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Typed view of the header's packet type, `None` for unknown values.
    pub fn packet_type(&self) -> Option<PacketType> {
        PacketType::from_wire(self.header.packet_type)
    }

    /// Typed view of the header's status, `None` for unknown values.
    pub fn status(&self) -> Option<PacketStatus> {
        PacketStatus::from_wire(self.header.status)
    }

    /// Payload as text, with invalid byte sequences replaced.
    ///
    /// Payload encoding correctness is a peer concern, not a framing
    /// concern, so this never fails.
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_wire_values_round_trip() {
        for ty in [
            PacketType::Query,
            PacketType::Response,
            PacketType::Error,
            PacketType::Heartbeat,
            PacketType::Auth,
            PacketType::AuthResponse,
            PacketType::Disconnect,
            PacketType::Keepalive,
        ] {
            assert_eq!(PacketType::from_wire(ty as u16), Some(ty));
        }
        assert_eq!(PacketType::from_wire(0x0000), None);
        assert_eq!(PacketType::from_wire(0x0009), None);
    }

    #[test]
    fn test_status_wire_values_round_trip() {
        for status in [
            PacketStatus::Ok,
            PacketStatus::Error,
            PacketStatus::Pending,
            PacketStatus::Timeout,
            PacketStatus::AuthFailed,
            PacketStatus::PermissionDenied,
            PacketStatus::InvalidQuery,
            PacketStatus::ServerError,
        ] {
            assert_eq!(PacketStatus::from_wire(status as u16), Some(status));
        }
        assert_eq!(PacketStatus::from_wire(0x0008), None);
    }

    #[test]
    fn test_payload_text_replaces_invalid_utf8() {
        let packet = Packet {
            header: PacketHeader {
                magic: MAGIC,
                version: PROTOCOL_VERSION,
                packet_type: PacketType::Response as u16,
                status: PacketStatus::Ok as u16,
                sequence: 1,
                data_length: 4,
            },
            payload: vec![b'o', b'k', 0xFF, 0xFE],
        };
        let text = packet.payload_text();
        assert!(text.starts_with("ok"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_size_constants_are_consistent() {
        assert_eq!(MIN_PACKET_SIZE, 20);
        assert_eq!(MAX_PAYLOAD_SIZE + HEADER_SIZE + TRAILER_SIZE, MAX_PACKET_SIZE);
        // data_length must be representable in its 16-bit header field
        assert!(MAX_PAYLOAD_SIZE <= u16::MAX as usize);
    }
}
