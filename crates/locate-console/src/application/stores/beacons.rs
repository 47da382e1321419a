//! Known beacon identities.
//!
//! A sorted, deduplicated set of canonical tokens.  `MacList` replaces it,
//! `MacListAdd` and `MacListRemove` patch it, and `MacRemoved` confirms a
//! removal this console asked for.  Both removal paths go through the same
//! idempotent remove, so a confirmation for a beacon already removed
//! optimistically changes nothing.

use std::collections::BTreeSet;
use std::rc::Rc;

use locate_core::{InboundFrame, MacAddress, OutboundFrame};

use crate::application::outbound::{send_or_warn, FrameSink};
use crate::application::router::FrameConsumer;
use crate::application::state_cell::{StateCell, Subscription};

pub type BeaconSet = BTreeSet<MacAddress>;

pub struct BeaconStore {
    cell: StateCell<BeaconSet>,
    sink: Rc<dyn FrameSink>,
}

impl BeaconStore {
    pub fn new(sink: Rc<dyn FrameSink>) -> Self {
        Self {
            cell: StateCell::default(),
            sink,
        }
    }

    /// Asks the server for the full list.
    pub fn request(&self) -> bool {
        send_or_warn(self.sink.as_ref(), OutboundFrame::GetMacList)
    }

    pub fn snapshot(&self) -> Rc<BeaconSet> {
        self.cell.get()
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.cell.get().contains(mac)
    }

    pub fn subscribe(&self, listener: impl Fn(&Rc<BeaconSet>) + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }

    /// Removes `mac` locally, then sends `RemoveMac`.
    pub fn remove(&self, mac: MacAddress) {
        self.remove_all(std::slice::from_ref(&mac));
        send_or_warn(self.sink.as_ref(), OutboundFrame::RemoveMac { mac });
    }

    fn replace_all(&self, macs: &[MacAddress]) {
        let next: BeaconSet = macs.iter().copied().collect();
        self.cell.update(|current| (*current != next).then_some(next));
    }

    fn add_all(&self, macs: &[MacAddress]) {
        self.cell.update(|current| {
            if macs.iter().all(|m| current.contains(m)) {
                return None;
            }
            let mut next = current.clone();
            next.extend(macs.iter().copied());
            Some(next)
        });
    }

    fn remove_all(&self, macs: &[MacAddress]) {
        self.cell.update(|current| {
            if !macs.iter().any(|m| current.contains(m)) {
                return None;
            }
            let mut next = current.clone();
            for mac in macs {
                next.remove(mac);
            }
            Some(next)
        });
    }
}

impl FrameConsumer for BeaconStore {
    fn name(&self) -> &'static str {
        "beacons"
    }

    fn consume(&self, frame: &InboundFrame) -> bool {
        match frame {
            InboundFrame::MacList { macs } => self.replace_all(macs),
            InboundFrame::MacListAdd { macs } => self.add_all(macs),
            InboundFrame::MacListRemove { macs } => self.remove_all(macs),
            InboundFrame::MacRemoved { mac } => self.remove_all(std::slice::from_ref(mac)),
            _ => return false,
        }
        true
    }
}
