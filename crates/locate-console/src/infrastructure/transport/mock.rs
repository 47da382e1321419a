//! In-memory frame sink for tests.
//!
//! `RecordingSink` stands in for [`ConnectionManager`](super::ConnectionManager)
//! when a test needs a whole [`Console`](crate::application::Console) without
//! a server.  It records every frame accepted while "connected" and refuses
//! frames with [`SendError::NotConnected`] otherwise, exactly like the real
//! transport.
//!
//! # Usage in tests
//!
//! ```ignore
//! let sink = Rc::new(RecordingSink::connected());
//! let console = Console::new(Rc::clone(&sink) as Rc<dyn FrameSink>, &cfg);
//!
//! console.handle_command(OperatorCommand::Remove(mac))?;
//!
//! assert_eq!(sink.sent(), vec![OutboundFrame::RemoveMac { mac }]);
//! ```

use std::cell::{Cell, RefCell};

use locate_core::{encode_frame, OutboundFrame};

use crate::application::outbound::{FrameSink, SendError};

/// Records outbound frames instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    connected: Cell<bool>,
    sent: RefCell<Vec<OutboundFrame>>,
    rejected: Cell<usize>,
}

impl RecordingSink {
    /// A sink that starts disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that accepts frames right away.
    pub fn connected() -> Self {
        let sink = Self::default();
        sink.connected.set(true);
        sink
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.set(connected);
    }

    /// Every frame accepted so far, oldest first.
    pub fn sent(&self) -> Vec<OutboundFrame> {
        self.sent.borrow().clone()
    }

    /// Frames accepted so far, as the JSON text the server would receive.
    pub fn sent_json(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter_map(|f| encode_frame(f).ok())
            .collect()
    }

    /// Returns and forgets every frame accepted so far.
    pub fn take(&self) -> Vec<OutboundFrame> {
        self.sent.take()
    }

    /// How many sends were refused while disconnected.
    pub fn rejected(&self) -> usize {
        self.rejected.get()
    }
}

impl FrameSink for RecordingSink {
    fn send(&self, frame: &OutboundFrame) -> Result<(), SendError> {
        if !self.connected.get() {
            self.rejected.set(self.rejected.get() + 1);
            return Err(SendError::NotConnected);
        }
        encode_frame(frame)?;
        self.sent.borrow_mut().push(frame.clone());
        Ok(())
    }
}
