//! Plain records carried by inbound frames and kept by the console's stores.
//!
//! These are value types only.  Decoding from JSON (with its coercion rules)
//! lives in [`crate::protocol::codec`]; the serde derives here are used for
//! printing snapshots and for tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identity::MacAddress;

/// Map id assumed for locate results that do not name one.
pub const DEFAULT_MAP_ID: &str = "default";

/// One entry of the site map catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    pub id: String,
    pub name: String,
    /// Image file name on the server.
    pub file: String,
    /// URL the image can be fetched from.
    pub url: String,
    /// Pixels-per-meter ratio, when the server already knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

/// Position of one anchor (gateway) on a map, in world meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorCoord {
    pub mac: MacAddress,
    pub x: f64,
    pub y: f64,
}

/// One gateway's view of a located target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorObservation {
    /// Gateway identity.
    pub gmac: MacAddress,
    /// Estimated distance in meters.
    pub distance: f64,
    /// Received signal strength in dBm.
    pub rssi: i32,
}

/// A position estimate produced by the locate engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocateObservation {
    pub map_id: String,
    pub target_id: MacAddress,
    /// Hardware model string, e.g. `MBT02`.  Empty when not reported.
    pub device_type: String,
    pub x: f64,
    pub y: f64,
    pub signal: i32,
    pub anchors: Vec<AnchorObservation>,
    /// Engine-side timestamp in Unix milliseconds, if sent.
    pub timestamp: Option<u64>,
}

/// Kind of decoded payload attached to a telemetry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsedKind {
    /// A relay frame listing nearby tags.
    Relay,
    /// A combined status frame (battery, tamper, inner MAC).
    Combo,
    /// A parsed block of some other type.
    Other,
    /// The gateway could not parse the advertisement.
    None,
}

/// One raw BLE advertisement as forwarded by a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: MacAddress,
    pub signal: i32,
    /// Advertisement length in bytes.
    pub len: u32,
    /// Space-separated hex bytes.
    pub data: String,
    /// Advertised type hint (`beacon`, ...), if any.
    pub kind: Option<String>,
    /// Gateway-side decode of the payload, kept opaque.
    pub parsed: Option<Value>,
}

impl TelemetryRecord {
    pub fn parsed_kind(&self) -> ParsedKind {
        match &self.parsed {
            None | Some(Value::Null) => ParsedKind::None,
            Some(v) => match v.get("type").and_then(Value::as_str) {
                Some("relay") => ParsedKind::Relay,
                Some("combo") => ParsedKind::Combo,
                _ => ParsedKind::Other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(parsed: Option<Value>) -> TelemetryRecord {
        TelemetryRecord {
            id: MacAddress::parse("C3:00:00:30:01:02").unwrap(),
            signal: -60,
            len: 27,
            data: "01 02".to_string(),
            kind: None,
            parsed,
        }
    }

    #[test]
    fn test_parsed_kind_classifies_by_type_field() {
        assert_eq!(record(None).parsed_kind(), ParsedKind::None);
        assert_eq!(record(Some(Value::Null)).parsed_kind(), ParsedKind::None);
        assert_eq!(record(Some(json!({"type": "relay"}))).parsed_kind(), ParsedKind::Relay);
        assert_eq!(record(Some(json!({"type": "combo"}))).parsed_kind(), ParsedKind::Combo);
        assert_eq!(record(Some(json!({"vendor": 1}))).parsed_kind(), ParsedKind::Other);
    }

    #[test]
    fn test_map_info_ratio_is_optional_on_the_wire() {
        let info: MapInfo =
            serde_json::from_value(json!({"id": "m1", "name": "L1", "file": "l1.png", "url": "/maps/l1.png"}))
                .unwrap();
        assert_eq!(info.ratio, None);
    }
}
