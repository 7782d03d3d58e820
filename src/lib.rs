//! # MHUX Client
//!
//! Client library for MHUX data servers, speaking a length-prefixed,
//! checksummed binary packet protocol over TLS.
//!
//! The library is strictly layered:
//! - [`core`]: packet types and the pure wire codec (no I/O)
//! - [`transport`]: TLS establishment and the framed session that turns a
//!   chunked byte stream into whole packets
//! - [`service`]: the high-level client with query, authenticate,
//!   heartbeat, and disconnect operations
//!
//! The interactive shell and batch runner live in the `mhux-client` binary
//! and drive [`service::client::Client`] with strict request/response
//! turn-taking: one `send`, one `receive`, repeat.
//!
//! ## Example
//! ```no_run
//! use mhux_client::service::client::Client;
//! use mhux_client::transport::tls::TlsClientConfig;
//!
//! # async fn run() -> mhux_client::error::Result<()> {
//! let config = TlsClientConfig::new("db.example.com");
//! let mut client = Client::connect("db.example.com:18482", config).await?;
//! let answer = client.query("GET users;").await?;
//! println!("{answer}");
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::core::codec::PacketCodec;
pub use crate::core::packet::{Packet, PacketHeader, PacketStatus, PacketType};
pub use crate::error::{ProtocolError, Result};
pub use crate::service::client::Client;
pub use crate::transport::session::FramedSession;
pub use crate::transport::tls::TlsClientConfig;
