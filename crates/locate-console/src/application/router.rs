//! Inbound frame routing.
//!
//! The router owns a fixed, ordered list of consumers and offers every
//! decoded frame to each of them in turn.  A consumer *claims* a frame by
//! returning `true` from [`FrameConsumer::consume`]; several consumers may
//! claim the same frame (a `MapList` feeds both the catalog and the scale
//! store).  Frames nobody claims are counted and logged, never an error.
//!
//! Dispatch is synchronous: every `consume` must be cheap and must not wait.

use std::cell::Cell;
use std::rc::Rc;

use locate_core::InboundFrame;
use tracing::debug;

/// A store that may act on inbound frames.
pub trait FrameConsumer {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Applies `frame` if it is relevant and returns whether it was claimed.
    ///
    /// Frames with tags the consumer does not handle must leave its state
    /// untouched and return `false`.
    fn consume(&self, frame: &InboundFrame) -> bool;
}

/// Fans inbound frames out to the registered consumers.
pub struct MessageRouter {
    consumers: Vec<Rc<dyn FrameConsumer>>,
    dispatched: Cell<u64>,
    unclaimed: Cell<u64>,
}

impl MessageRouter {
    /// Builds a router over `consumers`, which are asked in this order.
    pub fn new(consumers: Vec<Rc<dyn FrameConsumer>>) -> Self {
        Self {
            consumers,
            dispatched: Cell::new(0),
            unclaimed: Cell::new(0),
        }
    }

    /// Offers `frame` to every consumer and returns how many claimed it.
    pub fn dispatch(&self, frame: &InboundFrame) -> usize {
        self.dispatched.set(self.dispatched.get() + 1);

        let mut claimed = 0;
        for consumer in &self.consumers {
            if consumer.consume(frame) {
                claimed += 1;
                debug!("{} claimed {}", consumer.name(), frame.tag());
            }
        }

        if claimed == 0 {
            self.unclaimed.set(self.unclaimed.get() + 1);
            debug!("no consumer claimed {}", frame.tag());
        }
        claimed
    }

    /// Total frames dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.get()
    }

    /// Frames that no consumer claimed.
    pub fn unclaimed(&self) -> u64 {
        self.unclaimed.get()
    }

    pub fn consumer_names(&self) -> Vec<&'static str> {
        self.consumers.iter().map(|c| c.name()).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Claims frames with one tag and records the order it was called in.
    struct TagConsumer {
        name: &'static str,
        tag: &'static str,
        calls: Rc<RefCell<Vec<&'static str>>>,
    }

    impl FrameConsumer for TagConsumer {
        fn name(&self) -> &'static str {
            self.name
        }

        fn consume(&self, frame: &InboundFrame) -> bool {
            self.calls.borrow_mut().push(self.name);
            frame.tag() == self.tag
        }
    }

    fn router(entries: &[(&'static str, &'static str)]) -> (MessageRouter, Rc<RefCell<Vec<&'static str>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let consumers = entries
            .iter()
            .map(|&(name, tag)| {
                Rc::new(TagConsumer { name, tag, calls: Rc::clone(&calls) }) as Rc<dyn FrameConsumer>
            })
            .collect();
        (MessageRouter::new(consumers), calls)
    }

    #[test]
    fn test_dispatch_visits_consumers_in_order() {
        // Arrange
        let (router, calls) = router(&[("a", "X"), ("b", "Y"), ("c", "Z")]);

        // Act
        router.dispatch(&InboundFrame::Unknown { cmd: "Y".into() });

        // Assert
        assert_eq!(*calls.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dispatch_counts_multiple_claims() {
        let (router, _) = router(&[("catalog", "MapList"), ("scale", "MapList"), ("beacons", "MacList")]);

        let claimed = router.dispatch(&InboundFrame::MapList { maps: vec![] });

        assert_eq!(claimed, 2);
        assert_eq!(router.unclaimed(), 0);
    }

    #[test]
    fn test_dispatch_unclaimed_frame_is_counted() {
        let (router, _) = router(&[("a", "X")]);

        let claimed = router.dispatch(&InboundFrame::Unknown { cmd: "Nope".into() });

        assert_eq!(claimed, 0);
        assert_eq!(router.unclaimed(), 1);
        assert_eq!(router.dispatched(), 1);
    }
}
