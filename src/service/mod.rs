//! # Service Layer
//!
//! The high-level client built on the transport: typed operations (query,
//! authenticate, heartbeat, disconnect) over one framed TLS session.

pub mod client;
