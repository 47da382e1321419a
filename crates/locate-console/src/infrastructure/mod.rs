//! Infrastructure layer for locate-console.
//!
//! - `transport`: the WebSocket connection manager (implements `FrameSink`)
//! - `storage`: preference persistence
//! - `event_loop`: the single `select!` loop that feeds the console

pub mod event_loop;
pub mod storage;
pub mod transport;
