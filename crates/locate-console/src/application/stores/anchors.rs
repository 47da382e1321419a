//! Per-map anchor positions.
//!
//! Local edits are optimistic: the new position is stored and listeners are
//! notified before the `SetAnchorCoord` / `ClearAnchorCoord` frame is even
//! sent, and nothing is rolled back if the server never confirms.  An
//! `AnchorCoords` frame replaces the whole set for its map.
//!
//! Each map's set sits behind its own `Rc`, so editing one map leaves every
//! other map's snapshot pointer-equal to before.

use std::collections::BTreeMap;
use std::rc::Rc;

use locate_core::{AnchorCoord, InboundFrame, MacAddress, OutboundFrame};
use tracing::warn;

use crate::application::outbound::{send_or_warn, FrameSink};
use crate::application::router::FrameConsumer;
use crate::application::state_cell::{StateCell, Subscription};

pub type AnchorSet = BTreeMap<MacAddress, AnchorCoord>;
pub type AnchorSets = BTreeMap<String, Rc<AnchorSet>>;

pub struct AnchorStore {
    cell: StateCell<AnchorSets>,
    sink: Rc<dyn FrameSink>,
}

impl AnchorStore {
    pub fn new(sink: Rc<dyn FrameSink>) -> Self {
        Self {
            cell: StateCell::default(),
            sink,
        }
    }

    /// Asks the server for one map's anchors.
    pub fn request(&self, map_id: &str) -> bool {
        send_or_warn(
            self.sink.as_ref(),
            OutboundFrame::GetAnchorCoords {
                map_id: map_id.to_string(),
            },
        )
    }

    pub fn snapshot(&self) -> Rc<AnchorSets> {
        self.cell.get()
    }

    /// The anchor set of one map (empty if unknown).
    pub fn for_map(&self, map_id: &str) -> Rc<AnchorSet> {
        self.cell.get().get(map_id).cloned().unwrap_or_default()
    }

    pub fn get(&self, map_id: &str, mac: &MacAddress) -> Option<AnchorCoord> {
        self.cell.get().get(map_id)?.get(mac).copied()
    }

    pub fn subscribe(&self, listener: impl Fn(&Rc<AnchorSets>) + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }

    /// Places `mac` at `(x, y)` on `map_id` and sends `SetAnchorCoord`.
    pub fn set_coord(&self, map_id: &str, mac: MacAddress, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            warn!("rejecting non-finite position ({x}, {y}) for anchor {mac}");
            return false;
        }
        let coord = AnchorCoord { mac, x, y };
        self.cell.update(|sets| {
            let current = sets.get(map_id);
            if current.and_then(|set| set.get(&mac)) == Some(&coord) {
                return None;
            }
            let mut set = current.map(|s| AnchorSet::clone(s)).unwrap_or_default();
            set.insert(mac, coord);
            let mut next = sets.clone();
            next.insert(map_id.to_string(), Rc::new(set));
            Some(next)
        });
        send_or_warn(
            self.sink.as_ref(),
            OutboundFrame::SetAnchorCoord {
                map_id: map_id.to_string(),
                mac,
                x,
                y,
            },
        );
        true
    }

    /// Removes `mac` from `map_id` and sends `ClearAnchorCoord`.
    pub fn clear_coord(&self, map_id: &str, mac: MacAddress) {
        self.cell.update(|sets| {
            let set = sets.get(map_id)?;
            if !set.contains_key(&mac) {
                return None;
            }
            let mut set = AnchorSet::clone(set);
            set.remove(&mac);
            let mut next = sets.clone();
            next.insert(map_id.to_string(), Rc::new(set));
            Some(next)
        });
        send_or_warn(
            self.sink.as_ref(),
            OutboundFrame::ClearAnchorCoord {
                map_id: map_id.to_string(),
                mac,
            },
        );
    }
}

impl FrameConsumer for AnchorStore {
    fn name(&self) -> &'static str {
        "anchors"
    }

    fn consume(&self, frame: &InboundFrame) -> bool {
        let InboundFrame::AnchorCoords { map_id, items } = frame else {
            return false;
        };
        let set: AnchorSet = items.iter().map(|c| (c.mac, *c)).collect();
        self.cell.update(|sets| {
            if sets.get(map_id).map(|s| s.as_ref()) == Some(&set) {
                return None;
            }
            let mut next = sets.clone();
            next.insert(map_id.clone(), Rc::new(set));
            Some(next)
        });
        true
    }
}
