//! Integration tests for the WebSocket connection manager.
//!
//! Each test binds a throwaway `tokio-tungstenite` server on an ephemeral
//! loopback port and points a [`ConnectionManager`] at it.  They verify:
//!
//! - the status sequence on connect, close, and reconnect
//! - that `start` is idempotent while a connection is open
//! - that inbound text and binary frames are decoded and delivered, and
//!   undecodable ones are dropped without closing the connection
//! - that `send` reaches the server while connected and fails fast, without
//!   touching the status, while disconnected

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use locate_console::application::{FrameSink, SendError};
use locate_console::domain::{ConnectionStatus, ConsoleConfig, Endpoint, TransportEvent};
use locate_console::infrastructure::transport::ConnectionManager;
use locate_core::{InboundFrame, MacAddress, OutboundFrame};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage, WebSocketStream};

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn bind() -> (TcpListener, ConsoleConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
    let port = listener.local_addr().expect("local addr").port();
    let config = ConsoleConfig {
        endpoint: Endpoint::new("ws", "127.0.0.1", port, "/"),
        reconnect_delay: Duration::from_millis(50),
        ..ConsoleConfig::default()
    };
    (listener, config)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("client must connect within 5s")
        .expect("accept");
    accept_async(stream).await.expect("handshake")
}

async fn next_event(rx: &mut UnboundedReceiver<TransportEvent>) -> TransportEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within 5s")
        .expect("event channel open")
}

async fn expect_status(rx: &mut UnboundedReceiver<TransportEvent>, status: ConnectionStatus) {
    assert_eq!(next_event(rx).await, TransportEvent::Status(status));
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_reports_connecting_then_connected() {
    // Arrange
    let (listener, config) = bind().await;
    let (manager, mut rx) = ConnectionManager::new(&config);

    // Act
    manager.start();
    let _server = accept(&listener).await;

    // Assert
    expect_status(&mut rx, ConnectionStatus::Connecting).await;
    expect_status(&mut rx, ConnectionStatus::Connected).await;
    assert_eq!(manager.status(), ConnectionStatus::Connected);
    manager.shutdown();
}

#[tokio::test]
async fn test_start_twice_while_connected_opens_one_connection() {
    let (listener, config) = bind().await;
    let (manager, mut rx) = ConnectionManager::new(&config);
    manager.start();
    let _server = accept(&listener).await;
    expect_status(&mut rx, ConnectionStatus::Connecting).await;
    expect_status(&mut rx, ConnectionStatus::Connected).await;

    let started_again = manager.start();

    assert!(!started_again);
    let second = timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(second.is_err(), "no second connection may be opened");
    manager.shutdown();
}

#[tokio::test]
async fn test_inbound_frames_are_decoded_and_bad_ones_dropped() {
    // Arrange
    let (listener, config) = bind().await;
    let (manager, mut rx) = ConnectionManager::new(&config);
    manager.start();
    let mut server = accept(&listener).await;
    expect_status(&mut rx, ConnectionStatus::Connecting).await;
    expect_status(&mut rx, ConnectionStatus::Connected).await;

    // Act
    server.send(WsMessage::Text("not json".into())).await.expect("send");
    server.send(WsMessage::Binary(vec![0xff, 0xfe, 0x00])).await.expect("send");
    server
        .send(WsMessage::Binary(br#"{"cmd":"MacRemoved","mac":"c3:00:00:24:00:01"}"#.to_vec()))
        .await
        .expect("send");
    server
        .send(WsMessage::Text(r#"{"cmd":"Scale","mapId":"m1","ratio":"32.5"}"#.into()))
        .await
        .expect("send");

    // Assert
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Frame(InboundFrame::MacRemoved {
            mac: MacAddress::parse("C3:00:00:24:00:01").unwrap(),
        })
    );
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::Frame(InboundFrame::Scale { map_id: "m1".into(), ratio: 32.5 })
    );
    assert_eq!(manager.status(), ConnectionStatus::Connected);
    manager.shutdown();
}

#[tokio::test]
async fn test_send_while_connected_reaches_server() {
    let (listener, config) = bind().await;
    let (manager, mut rx) = ConnectionManager::new(&config);
    manager.start();
    let mut server = accept(&listener).await;
    expect_status(&mut rx, ConnectionStatus::Connecting).await;
    expect_status(&mut rx, ConnectionStatus::Connected).await;

    assert_ok!(manager.send(&OutboundFrame::GetScale { map_id: "m1".into() }));

    let received = timeout(Duration::from_secs(5), server.next())
        .await
        .expect("frame within 5s")
        .expect("stream open")
        .expect("valid frame");
    assert_eq!(received, WsMessage::Text(r#"{"cmd":"GetScale","mapId":"m1"}"#.into()));
    manager.shutdown();
}

#[tokio::test]
async fn test_server_close_disconnects_and_send_fails_fast() {
    // Arrange
    let (listener, config) = bind().await;
    let (manager, mut rx) = ConnectionManager::new(&config);
    manager.start();
    let mut server = accept(&listener).await;
    expect_status(&mut rx, ConnectionStatus::Connecting).await;
    expect_status(&mut rx, ConnectionStatus::Connected).await;

    // Act
    server.close(None).await.expect("close");
    expect_status(&mut rx, ConnectionStatus::Disconnected).await;
    let result = manager.send(&OutboundFrame::GetMacList);

    // Assert
    assert_err!(&result);
    assert_eq!(result, Err(SendError::NotConnected));
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
    manager.shutdown();
}

#[tokio::test]
async fn test_reconnects_after_fixed_delay() {
    let (listener, config) = bind().await;
    let (manager, mut rx) = ConnectionManager::new(&config);
    manager.start();
    let mut first = accept(&listener).await;
    expect_status(&mut rx, ConnectionStatus::Connecting).await;
    expect_status(&mut rx, ConnectionStatus::Connected).await;

    first.close(None).await.expect("close");
    expect_status(&mut rx, ConnectionStatus::Disconnected).await;
    let _second = accept(&listener).await;

    expect_status(&mut rx, ConnectionStatus::Connecting).await;
    expect_status(&mut rx, ConnectionStatus::Connected).await;
    manager.shutdown();
}

#[tokio::test]
async fn test_shutdown_reports_disconnected() {
    let (listener, config) = bind().await;
    let (manager, mut rx) = ConnectionManager::new(&config);
    manager.start();
    let _server = accept(&listener).await;
    expect_status(&mut rx, ConnectionStatus::Connecting).await;
    expect_status(&mut rx, ConnectionStatus::Connected).await;

    manager.shutdown();

    expect_status(&mut rx, ConnectionStatus::Disconnected).await;
    assert_eq!(manager.send(&OutboundFrame::GetMapList), Err(SendError::NotConnected));
}
