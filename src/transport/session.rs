//! # Framed Session
//!
//! Turns a connected, ordered, reliable-but-chunked byte stream into a
//! sequence of complete packets, and vice versa.
//!
//! A session owns its stream, a monotonically increasing sequence counter
//! (assigned at send time, starting at 1, never reused), and a connection-
//! live flag. Callers drive it with strict request/response turn-taking: at
//! most one `send` followed by at most one `receive` before the next `send`.
//! `&mut self` receivers make concurrent in-flight use a compile error; if
//! shared use is ever needed, the owner must serialize access with a lock.
//!
//! The crux of correctness is the exact-read primitive: a single underlying
//! read may return fewer bytes than requested even when more are coming, so
//! the read loop accumulates across calls and treats only a zero-byte read
//! as end-of-stream. There is no framing-layer timeout; a stalled peer
//! blocks the caller, and timeout policy belongs to whoever owns the stream.
//!
//! A session moves Closed only once, on [`FramedSession::close`], stream
//! error teardown, or process shutdown, and is never reused afterwards;
//! reconnecting means a new stream plus a new session with a fresh counter.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::core::codec::PacketCodec;
use crate::core::packet::{
    Packet, PacketStatus, PacketType, HEADER_SIZE, MAX_PAYLOAD_SIZE, TRAILER_SIZE,
};
use crate::error::{ProtocolError, Result};

/// Packet framing over a connected secure byte stream.
///
/// Generic over the stream so tests can substitute in-memory transports for
/// the TLS stream used in production.
pub struct FramedSession<S> {
    stream: S,
    sequence: u32,
    alive: bool,
}

impl<S> FramedSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a freshly connected stream. The sequence counter starts at 0
    /// and the first packet sent carries sequence 1.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            sequence: 0,
            alive: true,
        }
    }

    /// Whether the session can still be used.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Sequence number of the most recently sent packet (0 before any send).
    pub fn last_sequence(&self) -> u32 {
        self.sequence
    }

    /// Consume the session and return the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Send a query payload: type Query, status Pending, next sequence.
    ///
    /// Returns the sequence number assigned to the packet.
    pub async fn send(&mut self, payload: &[u8]) -> Result<u32> {
        self.send_packet(PacketType::Query, PacketStatus::Pending, payload)
            .await
    }

    /// Send a packet of any type, assigning the next sequence number.
    ///
    /// The counter is incremented before encoding, so a failed write still
    /// consumes its sequence number; numbers are never reused within a
    /// session. Fails with [`ProtocolError::WriteFailed`] if the session is
    /// not live or the stream write errors; never retries.
    pub async fn send_packet(
        &mut self,
        packet_type: PacketType,
        status: PacketStatus,
        payload: &[u8],
    ) -> Result<u32> {
        if !self.alive {
            return Err(ProtocolError::WriteFailed("session is closed".into()));
        }

        self.sequence += 1;
        let sequence = self.sequence;
        let frame = PacketCodec::encode(packet_type, status, sequence, payload)?;

        self.stream
            .write_all(&frame)
            .await
            .map_err(|e| ProtocolError::WriteFailed(e.to_string()))?;
        self.stream
            .flush()
            .await
            .map_err(|e| ProtocolError::WriteFailed(e.to_string()))?;

        trace!(
            sequence,
            kind = packet_type.name(),
            bytes = frame.len(),
            "frame written"
        );
        Ok(sequence)
    }

    /// Receive one packet and return its payload as text, with invalid
    /// byte sequences replaced.
    pub async fn receive(&mut self) -> Result<String> {
        let packet = self.receive_packet().await?;
        Ok(packet.payload_text().into_owned())
    }

    /// Receive one complete packet.
    ///
    /// Exact-reads the 16-byte header, parses only its length field to size
    /// the second exact-read (payload plus trailer), then hands the whole
    /// frame to the codec. Decode errors propagate unchanged and leave the
    /// live flag as it was: whether to tear down after a protocol error is
    /// the caller's decision.
    pub async fn receive_packet(&mut self) -> Result<Packet> {
        if !self.alive {
            return Err(ProtocolError::ConnectionClosed);
        }

        let mut frame = vec![0u8; HEADER_SIZE];
        self.read_exact_or_closed(&mut frame, 0).await?;

        let data_length = PacketCodec::peek_data_length(&frame)?;
        if data_length > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::OversizedPacket(data_length));
        }

        frame.resize(HEADER_SIZE + data_length + TRAILER_SIZE, 0);
        self.read_exact_or_closed(&mut frame, HEADER_SIZE).await?;

        let packet = PacketCodec::decode(&frame)?;
        debug!(
            sequence = packet.header.sequence,
            kind = packet.packet_type().map(PacketType::name).unwrap_or("unknown"),
            bytes = frame.len(),
            "frame received"
        );
        Ok(packet)
    }

    /// Close the session, shutting the underlying stream down exactly once.
    ///
    /// Safe to call when no send/receive is in flight, and a no-op on an
    /// already-closed session. A closed session is never reused.
    pub async fn close(&mut self) -> Result<()> {
        if !self.alive {
            return Ok(());
        }
        self.alive = false;
        self.stream.shutdown().await?;
        debug!(last_sequence = self.sequence, "session closed");
        Ok(())
    }

    /// Fill `buf[offset..]`, looping over partial reads.
    ///
    /// A zero-byte read means the peer closed the stream (reads block until
    /// data or closure, so it is definitive) and maps to
    /// [`ProtocolError::ConnectionClosed`] no matter how much of the request
    /// was already satisfied.
    async fn read_exact_or_closed(&mut self, buf: &mut [u8], offset: usize) -> Result<()> {
        let mut filled = offset;
        while filled < buf.len() {
            let n = self.stream.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            filled += n;
        }
        Ok(())
    }
}
