//! Raw gateway telemetry.
//!
//! Rows go into a bounded ring, newest first.  Alongside the ring the store
//! keeps every distinct id ever seen and the latest row per id; neither of
//! those is trimmed when rows fall off the end of the ring.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use locate_core::{InboundFrame, MacAddress, TelemetryRecord};

use crate::application::router::FrameConsumer;
use crate::application::state_cell::{StateCell, Subscription};

use super::now_ms;

/// One received advertisement.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRow {
    pub record: Rc<TelemetryRecord>,
    pub received_at_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    /// Newest first, at most `capacity` rows.
    pub rows: VecDeque<TelemetryRow>,
    pub seen_ids: BTreeSet<MacAddress>,
    /// Most recent row for each id.
    pub latest: BTreeMap<MacAddress, TelemetryRow>,
}

/// Holds telemetry.  Inbound only, so it has no outbound sink.
pub struct TelemetryStore {
    cell: StateCell<TelemetrySnapshot>,
    capacity: usize,
}

impl TelemetryStore {
    /// A zero `capacity` is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            cell: StateCell::default(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> Rc<TelemetrySnapshot> {
        self.cell.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&Rc<TelemetrySnapshot>) + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }

    fn push(&self, record: &TelemetryRecord) {
        let row = TelemetryRow {
            record: Rc::new(record.clone()),
            received_at_ms: now_ms(),
        };
        self.cell.update(|current| {
            let mut next = current.clone();
            next.rows.push_front(row.clone());
            next.rows.truncate(self.capacity);
            next.seen_ids.insert(record.id);
            next.latest.insert(record.id, row);
            Some(next)
        });
    }
}

impl FrameConsumer for TelemetryStore {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn consume(&self, frame: &InboundFrame) -> bool {
        let InboundFrame::Telemetry(record) = frame else {
            return false;
        };
        self.push(record);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u8, signal: i32) -> InboundFrame {
        InboundFrame::Telemetry(TelemetryRecord {
            id: MacAddress::from_bytes([0xC3, 0, 0, 0x24, 0, id]),
            signal,
            len: 10,
            data: String::new(),
            kind: Some("beacon".into()),
            parsed: None,
        })
    }

    #[test]
    fn test_rows_are_newest_first() {
        // Arrange
        let store = TelemetryStore::new(10);

        // Act
        store.consume(&frame(1, -50));
        store.consume(&frame(2, -60));

        // Assert
        let snap = store.snapshot();
        assert_eq!(snap.rows[0].record.signal, -60);
        assert_eq!(snap.rows[1].record.signal, -50);
    }

    #[test]
    fn test_ring_is_bounded_but_seen_ids_are_not() {
        let store = TelemetryStore::new(200);

        for i in 0..250u16 {
            store.consume(&frame((i % 251) as u8, -(i as i32)));
        }

        let snap = store.snapshot();
        assert_eq!(snap.rows.len(), 200);
        assert_eq!(snap.seen_ids.len(), 250);
        assert_eq!(snap.rows[0].record.signal, -249);
    }

    #[test]
    fn test_latest_row_per_id_keeps_last() {
        let store = TelemetryStore::new(5);
        store.consume(&frame(7, -40));
        store.consume(&frame(7, -80));

        let snap = store.snapshot();
        let id = MacAddress::from_bytes([0xC3, 0, 0, 0x24, 0, 7]);
        assert_eq!(snap.latest[&id].record.signal, -80);
        assert_eq!(snap.seen_ids.len(), 1);
    }

    #[test]
    fn test_zero_capacity_keeps_one_row() {
        let store = TelemetryStore::new(0);
        store.consume(&frame(1, -1));
        store.consume(&frame(2, -2));
        assert_eq!(store.snapshot().rows.len(), 1);
    }

    #[test]
    fn test_other_frames_are_declined() {
        let store = TelemetryStore::new(5);
        assert!(!store.consume(&InboundFrame::Unknown { cmd: "raw".into() }));
        assert!(store.snapshot().rows.is_empty());
    }
}
