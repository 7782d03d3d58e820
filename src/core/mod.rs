//! # Core Protocol Components
//!
//! Low-level packet types and the pure wire codec.
//!
//! This module is the foundation of the protocol: packet structure, the
//! binary wire format, and deterministic encode/decode with checksum
//! verification. Nothing here performs I/O.
//!
//! ## Components
//! - **Packet**: Header, payload, and the type/status enumerations
//! - **Codec**: Encode/decode between packets and wire bytes
//!
//! ## Wire Format
//! ```text
//! [Magic(4)] [Version(2)] [Type(2)] [Status(2)] [Sequence(4)] [Length(2)] [Payload(N)] [CRC32(4)]
//! ```
//!
//! ## Safety Properties
//! - Maximum packet size: 64 KiB (length validated before allocation)
//! - Magic bytes and version gate decoding before the checksum is consulted
//! - CRC32 over header and payload detects corruption deterministically

pub mod codec;
pub mod packet;
