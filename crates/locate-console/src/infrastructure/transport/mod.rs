//! WebSocket transport to the locate server.
//!
//! [`ConnectionManager`] owns the single connection.  Calling
//! [`start`](ConnectionManager::start) spawns one supervisor task that loops
//! forever:
//!
//! ```text
//! Connecting ──connect ok──▶ Connected ──close/error──▶ Disconnected ──sleep──┐
//!     ▲   └──connect failed──────────────────────────────▶ Disconnected ──sleep──┤
//!     └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every status change and every decoded inbound frame is pushed to the
//! event channel returned by [`ConnectionManager::new`].  Undecodable
//! payloads are dropped here with a debug line and never reach the router.
//!
//! Outbound frames go through the [`FrameSink`] impl: the frame is encoded
//! on the caller's task and handed to the live session's writer channel.
//! While disconnected, `send` fails at once with
//! [`SendError::NotConnected`]; nothing is queued for later.
//!
//! # Threading
//!
//! The supervisor is the only spawned task, so the state it shares with the
//! manager (`Shared`) uses `Arc` and `std::sync::Mutex`.  Locks are held for
//! a field swap only and never across an `.await`.

pub mod mock;

use std::cell::RefCell;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use locate_core::{decode_frame, decode_payload, encode_frame, FrameError, InboundFrame, OutboundFrame};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::application::outbound::{FrameSink, SendError};
use crate::domain::{ConnectionStatus, ConsoleConfig, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// State shared between the manager and its supervisor task.
#[derive(Debug, Default)]
struct Shared {
    /// Writer for the live session; `None` while disconnected.
    writer: Mutex<Option<UnboundedSender<String>>>,
    status: Mutex<ConnectionStatus>,
}

impl Shared {
    fn set_writer(&self, writer: Option<UnboundedSender<String>>) {
        *self.writer.lock().unwrap_or_else(PoisonError::into_inner) = writer;
    }

    fn status(&self) -> ConnectionStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `next` and reports it.  Returns `false` once nobody is
    /// listening for events any more.
    fn publish(&self, next: ConnectionStatus, events: &UnboundedSender<TransportEvent>) -> bool {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = next;
        events.send(TransportEvent::Status(next)).is_ok()
    }
}

/// Manages the one WebSocket connection to the locate server.
pub struct ConnectionManager {
    url: String,
    reconnect_delay: Duration,
    shared: Arc<Shared>,
    events: UnboundedSender<TransportEvent>,
    supervisor: RefCell<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Creates an idle manager and the receiver its events are delivered on.
    pub fn new(config: &ConsoleConfig) -> (Self, UnboundedReceiver<TransportEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let manager = Self {
            url: config.endpoint.to_string(),
            reconnect_delay: config.reconnect_delay,
            shared: Arc::new(Shared::default()),
            events,
            supervisor: RefCell::new(None),
        };
        (manager, rx)
    }

    /// Starts the supervisor if it is not already running.
    ///
    /// Must be called from within a Tokio runtime.  Returns `false` when a
    /// supervisor is already alive, so repeated calls never open a second
    /// connection.
    pub fn start(&self) -> bool {
        let mut slot = self.supervisor.borrow_mut();
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("connection supervisor already running");
            return false;
        }
        info!("connecting to {}", self.url);
        *slot = Some(tokio::spawn(supervise(
            self.url.clone(),
            self.reconnect_delay,
            Arc::clone(&self.shared),
            self.events.clone(),
        )));
        true
    }

    /// Current connection state.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stops the supervisor and drops the live session, if any.
    pub fn shutdown(&self) {
        if let Some(handle) = self.supervisor.borrow_mut().take() {
            handle.abort();
        }
        self.shared.set_writer(None);
        if self.shared.status() != ConnectionStatus::Disconnected {
            let _ = self.shared.publish(ConnectionStatus::Disconnected, &self.events);
        }
        info!("transport stopped");
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.supervisor.get_mut().take() {
            handle.abort();
        }
    }
}

impl FrameSink for ConnectionManager {
    fn send(&self, frame: &OutboundFrame) -> Result<(), SendError> {
        let text = encode_frame(frame)?;
        let writer = self.shared.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match writer.as_ref() {
            Some(tx) if tx.send(text).is_ok() => Ok(()),
            _ => Err(SendError::NotConnected),
        }
    }
}

// ── Supervisor ────────────────────────────────────────────────────────────────

/// Connect/run/reconnect loop.  Ends only when the event receiver is dropped
/// or the task is aborted.
async fn supervise(
    url: String,
    delay: Duration,
    shared: Arc<Shared>,
    events: UnboundedSender<TransportEvent>,
) {
    loop {
        if !shared.publish(ConnectionStatus::Connecting, &events) {
            break;
        }

        match connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                let (tx, rx) = mpsc::unbounded_channel();
                shared.set_writer(Some(tx));
                info!("connected to {url}");
                if !shared.publish(ConnectionStatus::Connected, &events) {
                    shared.set_writer(None);
                    break;
                }
                run_session(stream, rx, &events).await;
                shared.set_writer(None);
            }
            Err(e) => warn!("could not connect to {url}: {e}"),
        }

        if !shared.publish(ConnectionStatus::Disconnected, &events) {
            break;
        }
        info!("reconnecting in {delay:?}");
        tokio::time::sleep(delay).await;
    }
    debug!("connection supervisor exiting");
}

/// Pumps one open connection until it closes.
async fn run_session(
    stream: WsStream,
    mut outbound: UnboundedReceiver<String>,
    events: &UnboundedSender<TransportEvent>,
) {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            incoming = read.next() => {
                let decoded = match incoming {
                    Some(Ok(WsMessage::Text(text))) => decode_frame(&text),
                    Some(Ok(WsMessage::Binary(bytes))) => decode_payload(&bytes),
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("server closed the connection");
                        break;
                    }
                    // Ping/pong is answered by tungstenite.
                    Some(Ok(_)) => continue,
                    Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                        info!("connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("connection error: {e}");
                        break;
                    }
                };
                if !deliver(decoded, events) {
                    break;
                }
            }
            Some(text) = outbound.recv() => {
                if let Err(e) = write.send(WsMessage::Text(text)).await {
                    warn!("write failed: {e}");
                    break;
                }
            }
        }
    }

    let _ = write.close().await;
}

/// Forwards a decoded frame.  Returns `false` once the receiver is gone.
fn deliver(decoded: Result<InboundFrame, FrameError>, events: &UnboundedSender<TransportEvent>) -> bool {
    match decoded {
        Ok(frame) => {
            debug!("received {}", frame.tag());
            events.send(TransportEvent::Frame(frame)).is_ok()
        }
        Err(e) => {
            debug!("dropping undecodable frame: {e}");
            true
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
