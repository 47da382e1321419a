//! locate-console library crate.
//!
//! The realtime sync core of the BLE locate operator console: one WebSocket
//! connection to the locate server, a router that hands each inbound frame to
//! the stores that care about it, six subscribable state stores, and the
//! interaction pipelines (scale calibration, anchor dragging) that turn
//! operator input into outbound commands.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! locate server (JSON over WebSocket)
//!         ↕
//! [locate-console]
//!   ├── domain/           Pure types: ConsoleConfig, ConnectionStatus, ActiveView
//!   ├── application/      State cells, stores, router, drag pipeline, commands
//!   └── infrastructure/
//!         ├── transport/  Connection manager (tokio-tungstenite)
//!         ├── storage/    Preference persistence (TOML)
//!         └── event_loop  One select! loop over every event source
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain`, `locate-core`, and the
//!   [`application::FrameSink`] trait only.  It never touches a socket.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tokio-tungstenite`.
//!
//! # Threading model
//!
//! Everything above the transport runs on one task and is built from `Rc`
//! and `RefCell`.  The only code that runs elsewhere is the connection
//! supervisor, which talks to the rest of the program through channels.

/// Domain layer: plain configuration and status types (no I/O).
pub mod domain;

/// Application layer: state stores, routing, and interaction pipelines.
pub mod application;

/// Infrastructure layer: WebSocket transport, preference storage, event loop.
pub mod infrastructure;
