//! # Error Types
//!
//! The closed set of failures a client operation can report.
//!
//! Error kinds are disjoint and are never coerced into one another, so a
//! caller can branch on the cause of a failure rather than on message text.
//!
//! ## Error Categories
//! - **Data integrity** (decode-time): `Truncated`, `BadMagic`,
//!   `UnsupportedVersion`, `ChecksumMismatch`, `OversizedPacket`
//! - **Liveness** (transport-time): `ConnectionClosed`, `WriteFailed`
//! - **Protocol exchange** (service-time): `SequenceMismatch`, `AuthFailed`,
//!   `UnexpectedPacket`
//! - **Ambient**: `Io`, `Tls`, `Config`
//!
//! None of these are retried internally; retry policy belongs to the caller.
//! After an integrity error the stream may be partially consumed, so tearing
//! the session down is the safe response.

use std::io;
use thiserror::Error;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("truncated packet: needed {needed} bytes, only {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("bad magic: 0x{0:08X}")]
    BadMagic(u32),

    #[error("unsupported protocol version: 0x{0:04X}")]
    UnsupportedVersion(u16),

    #[error("checksum mismatch: trailer 0x{expected:08X}, computed 0x{computed:08X}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    #[error("packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("response sequence {received} does not match request sequence {sent}")]
    SequenceMismatch { sent: u32, received: u32 },

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("unexpected packet type: {0}")]
    UnexpectedPacket(&'static str),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
