//! Connection lifecycle types shared by the transport and the console.

use std::fmt;

use locate_core::InboundFrame;

/// State of the single server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    #[default]
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

/// Events emitted by the transport to the console.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection changed state.
    Status(ConnectionStatus),
    /// A frame arrived and passed decoding.
    Frame(InboundFrame),
}
