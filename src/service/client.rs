//! High-level client for MHUX servers.
//!
//! One `Client` owns one TLS connection and one framed session, driven with
//! strict request/response turn-taking. Reconnecting means building a new
//! `Client` over a fresh stream, with its sequence counter restarting at 1.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info, instrument};

use crate::core::packet::{Packet, PacketStatus, PacketType};
use crate::error::{ProtocolError, Result};
use crate::transport::session::FramedSession;
use crate::transport::tls::{self, TlsClientConfig};

/// Client for query/response exchanges with an MHUX server.
///
/// Generic over the stream; production use is the TLS specialization built
/// by [`Client::connect`].
pub struct Client<S = TlsStream<TcpStream>> {
    session: FramedSession<S>,
    addr: String,
}

impl Client {
    /// Connect to a server and wrap the secure stream in a fresh session.
    #[instrument(skip(config))]
    pub async fn connect(addr: &str, config: TlsClientConfig) -> Result<Self> {
        let stream = tls::connect(addr, &config).await?;
        info!(address = %addr, "connected");

        Ok(Self::from_stream(stream, addr))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Build a client over an already-connected stream.
    pub fn from_stream(stream: S, addr: impl Into<String>) -> Self {
        Self {
            session: FramedSession::new(stream),
            addr: addr.into(),
        }
    }

    /// Send one query and wait for its answer.
    ///
    /// The response must carry the same sequence number as the request; a
    /// mismatch means the stream is out of step with the request/response
    /// turn-taking and fails with [`ProtocolError::SequenceMismatch`].
    /// Server-reported failures arrive as Error packets and are returned as
    /// their message text, like successful responses; the status field
    /// tells the two apart to callers that need it.
    pub async fn query(&mut self, query: &str) -> Result<String> {
        let sent = self.session.send(query.as_bytes()).await?;
        let packet = self.expect_reply(sent).await?;

        match packet.packet_type() {
            Some(PacketType::Response | PacketType::Error) => {
                debug!(
                    sequence = sent,
                    status = packet.status().map(PacketStatus::name).unwrap_or("unknown"),
                    "query answered"
                );
                Ok(packet.payload_text().into_owned())
            }
            Some(other) => Err(ProtocolError::UnexpectedPacket(other.name())),
            None => Err(ProtocolError::UnexpectedPacket("unknown")),
        }
    }

    /// Authenticate with the server.
    ///
    /// Credentials travel as a `user:pass` payload in an Auth packet; the
    /// server answers with an AuthResponse whose status is Ok on success.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let credentials = format!("{username}:{password}");
        let sent = self
            .session
            .send_packet(PacketType::Auth, PacketStatus::Pending, credentials.as_bytes())
            .await?;
        let packet = self.expect_reply(sent).await?;

        match packet.packet_type() {
            Some(PacketType::AuthResponse) => match packet.status() {
                Some(PacketStatus::Ok) => {
                    info!("authenticated");
                    Ok(())
                }
                _ => Err(ProtocolError::AuthFailed(
                    packet.payload_text().into_owned(),
                )),
            },
            Some(other) => Err(ProtocolError::UnexpectedPacket(other.name())),
            None => Err(ProtocolError::UnexpectedPacket("unknown")),
        }
    }

    /// Probe the connection with a heartbeat carrying the current UNIX time
    /// in seconds, big-endian.
    pub async fn heartbeat(&mut self) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let sent = self
            .session
            .send_packet(PacketType::Heartbeat, PacketStatus::Ok, &now.to_be_bytes())
            .await?;
        let packet = self.expect_reply(sent).await?;

        match packet.packet_type() {
            Some(PacketType::Heartbeat | PacketType::Keepalive | PacketType::Response) => Ok(()),
            Some(other) => Err(ProtocolError::UnexpectedPacket(other.name())),
            None => Err(ProtocolError::UnexpectedPacket("unknown")),
        }
    }

    /// Tell the server we are leaving, then close the session.
    ///
    /// The Disconnect packet is best-effort (the connection is going away
    /// either way), but the underlying stream is shut down exactly once.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.session.is_alive() {
            let _ = self
                .session
                .send_packet(PacketType::Disconnect, PacketStatus::Ok, &[])
                .await;
            self.session.close().await?;
            info!(address = %self.addr, "disconnected");
        }
        Ok(())
    }

    /// Whether the underlying session is still usable.
    pub fn is_connected(&self) -> bool {
        self.session.is_alive()
    }

    /// Address this client was connected to.
    pub fn server_addr(&self) -> &str {
        &self.addr
    }

    /// Receive the reply to the packet sent as `sent`, enforcing sequence
    /// correlation.
    async fn expect_reply(&mut self, sent: u32) -> Result<Packet> {
        let packet = self.session.receive_packet().await?;
        if packet.header.sequence != sent {
            return Err(ProtocolError::SequenceMismatch {
                sent,
                received: packet.header.sequence,
            });
        }
        Ok(packet)
    }
}
