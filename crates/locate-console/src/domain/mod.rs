//! Domain layer for locate-console.
//!
//! Plain types with no dependencies on I/O or async runtimes.
//!
//! # What does NOT belong here?
//!
//! - Any `tokio` or WebSocket types
//! - File I/O or environment variable reading

pub mod config;
pub mod connection;
pub mod view;

pub use config::{ConsoleConfig, Endpoint};
pub use connection::{ConnectionStatus, TransportEvent};
pub use view::ActiveView;
