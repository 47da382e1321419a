//! Typed frames exchanged with the locate server.
//!
//! Every frame on the wire is one JSON object whose `cmd` field names the
//! command.  Raw telemetry is the exception: gateways forward it without a
//! `cmd`, so a `{"raw": {...}}` object is recognised by shape instead.

use serde::Serialize;

use crate::domain::identity::MacAddress;
use crate::domain::model::{AnchorCoord, LocateObservation, MapInfo, TelemetryRecord};

// ── Inbound (server → console) ───────────────────────────────────────────────

/// A validated frame received from the server.
///
/// Produced only by [`crate::protocol::codec::decode_frame`]; once a frame
/// exists in this form, its fields have passed the per-tag parser.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Full site map catalog.
    MapList { maps: Vec<MapInfo> },
    /// Scale of one map.  The ratio is passed through unvalidated; the scale
    /// store decides whether it is usable.
    Scale { map_id: String, ratio: f64 },
    /// Full beacon list, replacing whatever was known.
    MacList { macs: Vec<MacAddress> },
    /// Beacons added on the server.
    MacListAdd { macs: Vec<MacAddress> },
    /// Beacons removed on the server by someone else.
    MacListRemove { macs: Vec<MacAddress> },
    /// Confirmation of a `RemoveMac` sent by this console.
    MacRemoved { mac: MacAddress },
    /// Full anchor set for one map.
    AnchorCoords { map_id: String, items: Vec<AnchorCoord> },
    /// A locate engine result.
    RelayLocated(LocateObservation),
    /// A raw advertisement forwarded by a gateway.
    Telemetry(TelemetryRecord),
    /// A well-formed frame with a command this console does not know.
    Unknown { cmd: String },
}

impl InboundFrame {
    /// The command tag, for logging.
    pub fn tag(&self) -> &str {
        match self {
            InboundFrame::MapList { .. } => "MapList",
            InboundFrame::Scale { .. } => "Scale",
            InboundFrame::MacList { .. } => "MacList",
            InboundFrame::MacListAdd { .. } => "MacListAdd",
            InboundFrame::MacListRemove { .. } => "MacListRemove",
            InboundFrame::MacRemoved { .. } => "MacRemoved",
            InboundFrame::AnchorCoords { .. } => "AnchorCoords",
            InboundFrame::RelayLocated(_) => "RelayLocated",
            InboundFrame::Telemetry(_) => "raw",
            InboundFrame::Unknown { cmd } => cmd,
        }
    }
}

// ── Outbound (console → server) ──────────────────────────────────────────────

/// A command sent to the server.
///
/// Serializes as `{"cmd": "<Variant>", ...fields}` with camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd")]
pub enum OutboundFrame {
    GetMapList,
    GetScale {
        #[serde(rename = "mapId")]
        map_id: String,
    },
    SetScale {
        #[serde(rename = "mapId")]
        map_id: String,
        ratio: f64,
    },
    GetMacList,
    RemoveMac {
        mac: MacAddress,
    },
    GetAnchorCoords {
        #[serde(rename = "mapId")]
        map_id: String,
    },
    SetAnchorCoord {
        #[serde(rename = "mapId")]
        map_id: String,
        mac: MacAddress,
        x: f64,
        y: f64,
    },
    ClearAnchorCoord {
        #[serde(rename = "mapId")]
        map_id: String,
        mac: MacAddress,
    },
}

impl OutboundFrame {
    /// The command tag, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            OutboundFrame::GetMapList => "GetMapList",
            OutboundFrame::GetScale { .. } => "GetScale",
            OutboundFrame::SetScale { .. } => "SetScale",
            OutboundFrame::GetMacList => "GetMacList",
            OutboundFrame::RemoveMac { .. } => "RemoveMac",
            OutboundFrame::GetAnchorCoords { .. } => "GetAnchorCoords",
            OutboundFrame::SetAnchorCoord { .. } => "SetAnchorCoord",
            OutboundFrame::ClearAnchorCoord { .. } => "ClearAnchorCoord",
        }
    }
}
