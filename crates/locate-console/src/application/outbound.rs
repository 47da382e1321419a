//! The outbound port: how the application layer hands frames to the transport.
//!
//! Stores never see a socket.  They hold an `Rc<dyn FrameSink>` and call
//! [`FrameSink::send`], which either hands the frame off immediately or fails
//! immediately.  Nothing is queued or retried.

use locate_core::{FrameError, OutboundFrame};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned by [`FrameSink::send`].
#[derive(Debug, Error, PartialEq)]
pub enum SendError {
    /// There is no open connection; the frame was dropped.
    #[error("not connected to the locate server")]
    NotConnected,

    /// The frame could not be serialized.
    #[error(transparent)]
    Encode(#[from] FrameError),
}

/// Something that can put an [`OutboundFrame`] on the wire.
#[cfg_attr(test, mockall::automock)]
pub trait FrameSink {
    /// Hands `frame` to the transport without blocking.
    ///
    /// # Errors
    ///
    /// [`SendError::NotConnected`] while disconnected.  Connection state is
    /// never changed by a failed send.
    fn send(&self, frame: &OutboundFrame) -> Result<(), SendError>;
}

/// Sends `frame` and logs a warning if it was dropped.
///
/// Local optimistic edits stay applied either way.
pub(crate) fn send_or_warn(sink: &dyn FrameSink, frame: OutboundFrame) -> bool {
    match sink.send(&frame) {
        Ok(()) => {
            debug!("sent {}", frame.tag());
            true
        }
        Err(e) => {
            warn!("{} not delivered: {e}", frame.tag());
            false
        }
    }
}
