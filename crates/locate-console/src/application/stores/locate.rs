//! Latest locate result per (map, target).
//!
//! Each `RelayLocated` overwrites the previous entry for its target.  There is
//! no history and no smoothing.

use std::collections::BTreeMap;
use std::rc::Rc;

use locate_core::{InboundFrame, LocateObservation, MacAddress};

use crate::application::router::FrameConsumer;
use crate::application::state_cell::{StateCell, Subscription};

use super::now_ms;

/// One stored result plus when this console received it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocateEntry {
    pub observation: LocateObservation,
    /// Local receipt time in Unix milliseconds.
    pub received_at_ms: u64,
}

pub type LocateResults = BTreeMap<MacAddress, LocateEntry>;
pub type LocateSets = BTreeMap<String, Rc<LocateResults>>;

/// Holds locate results.  Inbound only, so it has no outbound sink.
#[derive(Default)]
pub struct LocateStore {
    cell: StateCell<LocateSets>,
}

impl LocateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Rc<LocateSets> {
        self.cell.get()
    }

    pub fn for_map(&self, map_id: &str) -> Rc<LocateResults> {
        self.cell.get().get(map_id).cloned().unwrap_or_default()
    }

    pub fn get(&self, map_id: &str, target: &MacAddress) -> Option<LocateEntry> {
        self.cell.get().get(map_id)?.get(target).cloned()
    }

    pub fn subscribe(&self, listener: impl Fn(&Rc<LocateSets>) + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }

    fn record(&self, observation: &LocateObservation) {
        let entry = LocateEntry {
            observation: observation.clone(),
            received_at_ms: now_ms(),
        };
        self.cell.update(|sets| {
            let mut results = sets
                .get(&observation.map_id)
                .map(|r| LocateResults::clone(r))
                .unwrap_or_default();
            results.insert(observation.target_id, entry);
            let mut next = sets.clone();
            next.insert(observation.map_id.clone(), Rc::new(results));
            Some(next)
        });
    }
}

impl FrameConsumer for LocateStore {
    fn name(&self) -> &'static str {
        "locate"
    }

    fn consume(&self, frame: &InboundFrame) -> bool {
        let InboundFrame::RelayLocated(observation) = frame else {
            return false;
        };
        self.record(observation);
        true
    }
}
