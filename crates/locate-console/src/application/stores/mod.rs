//! The six domain state stores.
//!
//! Every store owns one [`StateCell`](crate::application::state_cell::StateCell),
//! implements [`FrameConsumer`](crate::application::router::FrameConsumer),
//! and exposes `subscribe`.  Stores that send commands take the outbound
//! [`FrameSink`](crate::application::outbound::FrameSink) in their constructor.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod anchors;
pub mod beacons;
pub mod locate;
pub mod map_catalog;
pub mod scale;
pub mod telemetry;

pub use anchors::{AnchorSet, AnchorSets, AnchorStore};
pub use beacons::{BeaconSet, BeaconStore};
pub use locate::{LocateEntry, LocateResults, LocateSets, LocateStore};
pub use map_catalog::MapCatalogStore;
pub use scale::{ScaleError, ScaleStore, ScaleTable};
pub use telemetry::{TelemetryRow, TelemetrySnapshot, TelemetryStore};

/// Local receipt timestamp in Unix milliseconds.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
