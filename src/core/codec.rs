//! # Packet Codec
//!
//! Deterministic, side-effect-free conversion between [`Packet`]s and their
//! wire representation.
//!
//! ```text
//! +--------+---------+------+--------+----------+--------+ - - - - + - - - - +
//! | magic  | version | type | status | sequence | length | payload | crc32   |
//! | 4      | 2       | 2    | 2      | 4        | 2      | N       | 4       |
//! +--------+---------+------+--------+----------+--------+ - - - - + - - - - +
//! |<-------------------- 16-byte header ----------------->|
//! ```
//!
//! All integers are big-endian. The CRC32 trailer covers every byte before
//! it (header and payload); the checksum field is excluded from its own
//! input. Header parsing is separate from payload slicing so the transport
//! layer can learn the payload length from the header before it knows how
//! many total bytes to read.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::core::packet::{
    Packet, PacketHeader, PacketStatus, PacketType, HEADER_SIZE, MAGIC, MAX_PAYLOAD_SIZE,
    PROTOCOL_VERSION, TRAILER_SIZE,
};
use crate::error::{ProtocolError, Result};

/// Pure encoder/decoder for the packet wire format. Stateless; no I/O.
pub struct PacketCodec;

impl PacketCodec {
    /// CRC32 (IEEE) over a contiguous `header || payload` region.
    pub fn checksum(bytes: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(bytes);
        hasher.finalize()
    }

    /// Serialize one packet.
    ///
    /// Fails only with [`ProtocolError::OversizedPacket`] when the payload
    /// exceeds [`MAX_PAYLOAD_SIZE`]; every smaller payload encodes.
    pub fn encode(
        packet_type: PacketType,
        status: PacketStatus,
        sequence: u32,
        payload: &[u8],
    ) -> Result<Bytes> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::OversizedPacket(payload.len()));
        }

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len() + TRAILER_SIZE);
        buf.put_u32(MAGIC);
        buf.put_u16(PROTOCOL_VERSION);
        buf.put_u16(packet_type as u16);
        buf.put_u16(status as u16);
        buf.put_u32(sequence);
        buf.put_u16(payload.len() as u16);
        buf.put_slice(payload);

        let crc = Self::checksum(&buf);
        buf.put_u32(crc);

        Ok(buf.freeze())
    }

    /// Read the declared payload length from a header prefix without
    /// validating the rest of the header.
    ///
    /// The transport layer uses this between its two exact-reads to size the
    /// second one.
    pub fn peek_data_length(header: &[u8]) -> Result<usize> {
        if header.len() < HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                needed: HEADER_SIZE,
                available: header.len(),
            });
        }
        Ok(u16::from_be_bytes([header[14], header[15]]) as usize)
    }

    /// Parse and validate one packet from a buffer holding exactly one
    /// header, payload, and checksum trailer.
    ///
    /// Bytes beyond the declared frame are ignored; the caller is expected
    /// to have sliced the buffer to the frame. Each failure mode is a
    /// distinct error kind, and magic/version gating happens before the
    /// checksum is consulted so a corrupt trailer can never mask a peer
    /// speaking the wrong protocol.
    ///
    /// No mutation, no side effects; decoding the same bytes twice gives
    /// the same answer.
    pub fn decode(buf: &[u8]) -> Result<Packet> {
        if buf.len() < HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                needed: HEADER_SIZE,
                available: buf.len(),
            });
        }

        let mut header_bytes = &buf[..HEADER_SIZE];
        let magic = header_bytes.get_u32();
        let version = header_bytes.get_u16();
        let packet_type = header_bytes.get_u16();
        let status = header_bytes.get_u16();
        let sequence = header_bytes.get_u32();
        let data_length = header_bytes.get_u16() as usize;

        if magic != MAGIC {
            return Err(ProtocolError::BadMagic(magic));
        }
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }
        if data_length > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::OversizedPacket(data_length));
        }

        let total = HEADER_SIZE + data_length + TRAILER_SIZE;
        if buf.len() < total {
            return Err(ProtocolError::Truncated {
                needed: total,
                available: buf.len(),
            });
        }

        let mut trailer = &buf[HEADER_SIZE + data_length..total];
        let expected = trailer.get_u32();
        let computed = Self::checksum(&buf[..HEADER_SIZE + data_length]);
        if expected != computed {
            return Err(ProtocolError::ChecksumMismatch { expected, computed });
        }

        Ok(Packet {
            header: PacketHeader {
                magic,
                version,
                packet_type,
                status,
                sequence,
                data_length: data_length as u16,
            },
            payload: buf[HEADER_SIZE..HEADER_SIZE + data_length].to_vec(),
        })
    }
}
