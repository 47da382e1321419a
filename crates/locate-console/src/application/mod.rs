//! Application layer for locate-console.
//!
//! Owns all in-memory state and turns inbound frames and operator commands
//! into state changes and outbound frames.  It talks to the outside world
//! through the [`FrameSink`] port only.

pub mod commands;
pub mod console;
pub mod drag;
pub mod outbound;
pub mod router;
pub mod state_cell;
pub mod stores;

pub use commands::{CommandParseError, OperatorCommand, ShowTarget};
pub use console::{CommandResult, Console, ConsoleError};
pub use drag::DragPipeline;
pub use outbound::{FrameSink, SendError};
pub use router::{FrameConsumer, MessageRouter};
pub use state_cell::{StateCell, Subscription};
