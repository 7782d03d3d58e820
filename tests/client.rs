#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Service-layer tests: the typed client operations over an in-memory
//! stream, with a scripted peer on the other end.

use tokio::io::{AsyncWriteExt, DuplexStream};

use mhux_client::core::codec::PacketCodec;
use mhux_client::core::packet::{PacketStatus, PacketType};
use mhux_client::error::ProtocolError;
use mhux_client::service::client::Client;
use mhux_client::transport::session::FramedSession;

fn pair() -> (Client<DuplexStream>, FramedSession<DuplexStream>) {
    let (client_end, server_end) = tokio::io::duplex(4096);
    (
        Client::from_stream(client_end, "test:0"),
        FramedSession::new(server_end),
    )
}

// ============================================================================
// QUERY
// ============================================================================

#[tokio::test]
async fn test_query_returns_response_payload() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        let request = server.receive_packet().await.unwrap();
        assert_eq!(request.packet_type(), Some(PacketType::Query));
        assert_eq!(request.payload, b"COUNT users;");
        server
            .send_packet(PacketType::Response, PacketStatus::Ok, b"17")
            .await
            .unwrap();
    });

    let answer = client.query("COUNT users;").await.unwrap();
    assert_eq!(answer, "17");
    assert!(client.is_connected());

    server_task.await.unwrap();
}

#[tokio::test]
async fn test_query_surfaces_server_error_text() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        server.receive_packet().await.unwrap();
        server
            .send_packet(
                PacketType::Error,
                PacketStatus::InvalidQuery,
                b"syntax error near ';'",
            )
            .await
            .unwrap();
    });

    let answer = client.query("GARBAGE").await.unwrap();
    assert_eq!(answer, "syntax error near ';'");

    server_task.await.unwrap();
}

#[tokio::test]
async fn test_query_rejects_mismatched_sequence() {
    let (mut client, server) = pair();

    let server_task = tokio::spawn(async move {
        let mut server = server;
        server.receive_packet().await.unwrap();

        // Reply with a sequence the client never sent.
        let frame =
            PacketCodec::encode(PacketType::Response, PacketStatus::Ok, 99, b"stale").unwrap();
        let mut raw = server.into_inner();
        raw.write_all(&frame).await.unwrap();
    });

    let result = client.query("GET a;").await;
    assert!(matches!(
        result,
        Err(ProtocolError::SequenceMismatch {
            sent: 1,
            received: 99
        })
    ));

    server_task.await.unwrap();
}

#[tokio::test]
async fn test_query_rejects_unexpected_packet_type() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        server.receive_packet().await.unwrap();
        server
            .send_packet(PacketType::Keepalive, PacketStatus::Ok, &[])
            .await
            .unwrap();
    });

    let result = client.query("GET a;").await;
    assert!(matches!(
        result,
        Err(ProtocolError::UnexpectedPacket("keepalive"))
    ));

    server_task.await.unwrap();
}

// ============================================================================
// AUTHENTICATION
// ============================================================================

#[tokio::test]
async fn test_authenticate_sends_credentials_and_accepts_ok() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        let request = server.receive_packet().await.unwrap();
        assert_eq!(request.packet_type(), Some(PacketType::Auth));
        assert_eq!(request.payload, b"admin:s3cret");
        server
            .send_packet(PacketType::AuthResponse, PacketStatus::Ok, b"welcome")
            .await
            .unwrap();
    });

    client.authenticate("admin", "s3cret").await.unwrap();
    server_task.await.unwrap();
}

#[tokio::test]
async fn test_authenticate_maps_rejection_to_auth_failed() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        server.receive_packet().await.unwrap();
        server
            .send_packet(
                PacketType::AuthResponse,
                PacketStatus::AuthFailed,
                b"unknown user",
            )
            .await
            .unwrap();
    });

    let result = client.authenticate("ghost", "nope").await;
    match result {
        Err(ProtocolError::AuthFailed(message)) => assert_eq!(message, "unknown user"),
        other => panic!("expected AuthFailed, got {other:?}"),
    }

    server_task.await.unwrap();
}

// ============================================================================
// HEARTBEAT / DISCONNECT
// ============================================================================

#[tokio::test]
async fn test_heartbeat_round_trip() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        let request = server.receive_packet().await.unwrap();
        assert_eq!(request.packet_type(), Some(PacketType::Heartbeat));
        assert_eq!(request.payload.len(), 8); // big-endian UNIX seconds
        server
            .send_packet(PacketType::Heartbeat, PacketStatus::Ok, &[])
            .await
            .unwrap();
    });

    client.heartbeat().await.unwrap();
    server_task.await.unwrap();
}

#[tokio::test]
async fn test_disconnect_notifies_peer_and_is_idempotent() {
    let (mut client, mut server) = pair();

    let server_task = tokio::spawn(async move {
        let farewell = server.receive_packet().await.unwrap();
        assert_eq!(farewell.packet_type(), Some(PacketType::Disconnect));

        // The client's side of the stream is now shut down.
        let result = server.receive_packet().await;
        assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));
    });

    client.disconnect().await.unwrap();
    assert!(!client.is_connected());
    client.disconnect().await.unwrap();

    server_task.await.unwrap();
}
