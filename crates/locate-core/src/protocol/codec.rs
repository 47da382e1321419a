//! JSON codec for locate console frames.
//!
//! Decoding happens exactly once, at the transport boundary.  Each known
//! `cmd` has its own parser that validates the required fields and coerces
//! the rest:
//!
//! - numeric fields accept JSON numbers and numeric strings; anything else
//!   falls back to `0`
//! - identity tokens are normalized through [`MacAddress::parse`]
//! - an array field that is not an array makes the whole frame malformed
//! - an array *item* that fails validation is skipped and the frame survives
//!
//! Anything that fails here never reaches the stores.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::domain::identity::{IdentityError, MacAddress};
use crate::domain::model::{
    AnchorCoord, AnchorObservation, LocateObservation, MapInfo, TelemetryRecord, DEFAULT_MAP_ID,
};
use crate::protocol::frames::{InboundFrame, OutboundFrame};

/// Errors that can occur while decoding or encoding a frame.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    /// A binary payload was not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The text was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// The JSON was valid but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// A required field was absent or had the wrong type.
    #[error("{cmd} frame is missing required field {field:?}")]
    MissingField { cmd: String, field: &'static str },

    /// A field that must be an array was something else.
    #[error("{cmd} frame field {field:?} is not an array")]
    NotAnArray { cmd: String, field: &'static str },

    /// A required identity token did not normalize.
    #[error("{cmd} frame carries an invalid identity: {source}")]
    InvalidIdentity {
        cmd: String,
        #[source]
        source: IdentityError,
    },

    /// An outbound frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one text frame.
///
/// # Errors
///
/// Returns [`FrameError`] for invalid JSON, non-object JSON, or a known
/// command whose required fields fail validation.  Unknown commands are not
/// an error; they decode to [`InboundFrame::Unknown`].
///
/// # Examples
///
/// ```rust
/// use locate_core::{decode_frame, InboundFrame};
///
/// let frame = decode_frame(r#"{"cmd":"Scale","mapId":"m1","ratio":"42.5"}"#).unwrap();
/// assert_eq!(frame, InboundFrame::Scale { map_id: "m1".into(), ratio: 42.5 });
/// ```
pub fn decode_frame(text: &str) -> Result<InboundFrame, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(|e| FrameError::Json(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(FrameError::NotAnObject);
    };

    let Some(cmd) = obj.get("cmd").and_then(Value::as_str) else {
        if obj.contains_key("raw") {
            return parse_telemetry(&obj).map(InboundFrame::Telemetry);
        }
        return Err(FrameError::MissingField {
            cmd: String::new(),
            field: "cmd",
        });
    };

    match cmd {
        "MapList" => parse_map_list(&obj),
        "Scale" => parse_scale(&obj),
        "MacList" => parse_mac_array(cmd, &obj).map(|macs| InboundFrame::MacList { macs }),
        "MacListAdd" => parse_mac_array(cmd, &obj).map(|macs| InboundFrame::MacListAdd { macs }),
        "MacListRemove" => {
            parse_mac_array(cmd, &obj).map(|macs| InboundFrame::MacListRemove { macs })
        }
        "MacRemoved" => required_mac(cmd, &obj, &["mac"], "mac")
            .map(|mac| InboundFrame::MacRemoved { mac }),
        "AnchorCoords" => parse_anchor_coords(&obj),
        "RelayLocated" => parse_relay_located(&obj).map(InboundFrame::RelayLocated),
        other => Ok(InboundFrame::Unknown {
            cmd: other.to_string(),
        }),
    }
}

/// Decodes a binary payload by validating it as UTF-8 first.
///
/// # Errors
///
/// [`FrameError::InvalidUtf8`] for non-UTF-8 bytes, otherwise as
/// [`decode_frame`].
pub fn decode_payload(bytes: &[u8]) -> Result<InboundFrame, FrameError> {
    let text = std::str::from_utf8(bytes)?;
    decode_frame(text)
}

/// Encodes an outbound frame as JSON text.
///
/// # Errors
///
/// Returns [`FrameError::Encode`] if serialization fails.
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, FrameError> {
    serde_json::to_string(frame).map_err(|e| FrameError::Encode(e.to_string()))
}

// ── Per-tag parsers ──────────────────────────────────────────────────────────

fn parse_map_list(obj: &Map<String, Value>) -> Result<InboundFrame, FrameError> {
    let items = required_array("MapList", obj, "maps")?;
    let maps = items
        .iter()
        .filter_map(|item| {
            let entry = item.as_object()?;
            let Some(id) = field(entry, &["id"]).and_then(text_of) else {
                debug!("MapList: skipping entry without id");
                return None;
            };
            let name = field(entry, &["name"])
                .and_then(text_of)
                .unwrap_or_else(|| id.clone());
            Some(MapInfo {
                id,
                name,
                file: field(entry, &["file"]).and_then(text_of).unwrap_or_default(),
                url: field(entry, &["url"]).and_then(text_of).unwrap_or_default(),
                ratio: field(entry, &["ratio"]).and_then(number_of),
            })
        })
        .collect();
    Ok(InboundFrame::MapList { maps })
}

fn parse_scale(obj: &Map<String, Value>) -> Result<InboundFrame, FrameError> {
    let map_id = required_text("Scale", obj, &["mapId", "map_id"], "mapId")?;
    let ratio = number_or_zero(obj, &["ratio"]);
    Ok(InboundFrame::Scale { map_id, ratio })
}

fn parse_mac_array(cmd: &str, obj: &Map<String, Value>) -> Result<Vec<MacAddress>, FrameError> {
    let items = required_array(cmd, obj, "macs")?;
    Ok(items
        .iter()
        .filter_map(|item| match mac_of(item) {
            Some(Ok(mac)) => Some(mac),
            Some(Err(e)) => {
                debug!("{cmd}: skipping identity: {e}");
                None
            }
            None => None,
        })
        .collect())
}

fn parse_anchor_coords(obj: &Map<String, Value>) -> Result<InboundFrame, FrameError> {
    let map_id = required_text("AnchorCoords", obj, &["mapId", "map_id"], "mapId")?;
    let items = required_array("AnchorCoords", obj, "items")?;
    let items = items
        .iter()
        .filter_map(|item| {
            let entry = item.as_object()?;
            match field(entry, &["mac"]).and_then(mac_of) {
                Some(Ok(mac)) => Some(AnchorCoord {
                    mac,
                    x: number_or_zero(entry, &["x"]),
                    y: number_or_zero(entry, &["y"]),
                }),
                _ => {
                    debug!("AnchorCoords: skipping item without a valid mac");
                    None
                }
            }
        })
        .collect();
    Ok(InboundFrame::AnchorCoords { map_id, items })
}

fn parse_relay_located(obj: &Map<String, Value>) -> Result<LocateObservation, FrameError> {
    const CMD: &str = "RelayLocated";
    let target_id = required_mac(CMD, obj, &["relay_mac", "targetId", "mac"], "relay_mac")?;
    let map_id = field(obj, &["mapId", "map_id"])
        .and_then(text_of)
        .unwrap_or_else(|| DEFAULT_MAP_ID.to_string());

    let anchors = match obj.get("anchors") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let entry = item.as_object()?;
                let gmac = field(entry, &["gmac"]).and_then(mac_of)?.ok()?;
                Some(AnchorObservation {
                    gmac,
                    distance: number_or_zero(entry, &["distance"]),
                    rssi: signal_of(entry),
                })
            })
            .collect(),
        Some(_) => {
            return Err(FrameError::NotAnArray {
                cmd: CMD.to_string(),
                field: "anchors",
            })
        }
    };

    Ok(LocateObservation {
        map_id,
        target_id,
        device_type: field(obj, &["dev_type", "deviceType"])
            .and_then(text_of)
            .unwrap_or_default(),
        x: number_or_zero(obj, &["x"]),
        y: number_or_zero(obj, &["y"]),
        signal: signal_of(obj),
        anchors,
        timestamp: field(obj, &["timestamp"])
            .and_then(number_of)
            .filter(|t| *t >= 0.0)
            .map(|t| t as u64),
    })
}

fn parse_telemetry(obj: &Map<String, Value>) -> Result<TelemetryRecord, FrameError> {
    const CMD: &str = "raw";
    let raw = obj
        .get("raw")
        .and_then(Value::as_object)
        .ok_or_else(|| FrameError::MissingField {
            cmd: CMD.to_string(),
            field: "raw",
        })?;
    let id = required_mac(CMD, raw, &["mac", "id"], "mac")?;

    Ok(TelemetryRecord {
        id,
        signal: signal_of(raw),
        len: field(raw, &["len"])
            .and_then(number_of)
            .filter(|n| *n >= 0.0)
            .map_or(0, |n| n as u32),
        data: field(raw, &["data"]).and_then(text_of).unwrap_or_default(),
        kind: field(raw, &["type"]).and_then(text_of),
        parsed: field(obj, &["parsed"]).cloned(),
    })
}

// ── Field helpers ────────────────────────────────────────────────────────────

/// First non-null value among `names`.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

/// Strings as-is, numbers in their JSON spelling.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JSON numbers and numeric strings, finite only.
fn number_of(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn number_or_zero(obj: &Map<String, Value>, names: &[&str]) -> f64 {
    field(obj, names).and_then(number_of).unwrap_or(0.0)
}

fn signal_of(obj: &Map<String, Value>) -> i32 {
    number_or_zero(obj, &["rssi", "signal"]).round() as i32
}

fn mac_of(value: &Value) -> Option<Result<MacAddress, IdentityError>> {
    value.as_str().map(MacAddress::parse)
}

fn required_text(
    cmd: &str,
    obj: &Map<String, Value>,
    names: &[&str],
    field_name: &'static str,
) -> Result<String, FrameError> {
    field(obj, names)
        .and_then(text_of)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FrameError::MissingField {
            cmd: cmd.to_string(),
            field: field_name,
        })
}

fn required_mac(
    cmd: &str,
    obj: &Map<String, Value>,
    names: &[&str],
    field_name: &'static str,
) -> Result<MacAddress, FrameError> {
    match field(obj, names).and_then(mac_of) {
        Some(Ok(mac)) => Ok(mac),
        Some(Err(source)) => Err(FrameError::InvalidIdentity {
            cmd: cmd.to_string(),
            source,
        }),
        None => Err(FrameError::MissingField {
            cmd: cmd.to_string(),
            field: field_name,
        }),
    }
}

fn required_array<'a>(
    cmd: &str,
    obj: &'a Map<String, Value>,
    field_name: &'static str,
) -> Result<&'a Vec<Value>, FrameError> {
    match obj.get(field_name) {
        Some(Value::Array(items)) => Ok(items),
        None | Some(Value::Null) => Err(FrameError::MissingField {
            cmd: cmd.to_string(),
            field: field_name,
        }),
        Some(_) => Err(FrameError::NotAnArray {
            cmd: cmd.to_string(),
            field: field_name,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ParsedKind;

    fn mac(s: &str) -> MacAddress {
        MacAddress::parse(s).unwrap()
    }

    #[test]
    fn test_decode_unknown_cmd_is_not_an_error() {
        let frame = decode_frame(r#"{"cmd":"Heartbeat","n":1}"#).unwrap();
        assert_eq!(frame, InboundFrame::Unknown { cmd: "Heartbeat".into() });
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(matches!(decode_frame("{not json"), Err(FrameError::Json(_))));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert_eq!(decode_frame("[1,2,3]"), Err(FrameError::NotAnObject));
    }

    #[test]
    fn test_decode_object_without_cmd_or_raw_is_malformed() {
        assert!(matches!(
            decode_frame(r#"{"hello":"world"}"#),
            Err(FrameError::MissingField { field: "cmd", .. })
        ));
    }

    #[test]
    fn test_decode_payload_rejects_invalid_utf8() {
        let result = decode_payload(&[0x7B, 0xFF, 0xFE, 0x7D]);
        assert!(matches!(result, Err(FrameError::InvalidUtf8(_))));
    }

    #[test]
    fn test_decode_scale_coerces_numeric_string() {
        let frame = decode_frame(r#"{"cmd":"Scale","mapId":"m1","ratio":"12.5"}"#).unwrap();
        assert_eq!(frame, InboundFrame::Scale { map_id: "m1".into(), ratio: 12.5 });
    }

    #[test]
    fn test_decode_scale_garbage_ratio_falls_back_to_zero() {
        let frame = decode_frame(r#"{"cmd":"Scale","mapId":"m1","ratio":{"x":1}}"#).unwrap();
        assert_eq!(frame, InboundFrame::Scale { map_id: "m1".into(), ratio: 0.0 });
    }

    #[test]
    fn test_decode_scale_requires_map_id() {
        assert!(matches!(
            decode_frame(r#"{"cmd":"Scale","ratio":3}"#),
            Err(FrameError::MissingField { field: "mapId", .. })
        ));
    }

    #[test]
    fn test_decode_mac_list_skips_invalid_items() {
        let frame =
            decode_frame(r#"{"cmd":"MacList","macs":["aabbccddeeff", "zz", 42, "11-22-33-44-55-66"]}"#)
                .unwrap();
        assert_eq!(
            frame,
            InboundFrame::MacList {
                macs: vec![mac("AA:BB:CC:DD:EE:FF"), mac("11:22:33:44:55:66")]
            }
        );
    }

    #[test]
    fn test_decode_mac_list_non_array_is_malformed() {
        assert!(matches!(
            decode_frame(r#"{"cmd":"MacListAdd","macs":"AABBCCDDEEFF"}"#),
            Err(FrameError::NotAnArray { field: "macs", .. })
        ));
    }

    #[test]
    fn test_decode_mac_removed_requires_valid_mac() {
        assert!(matches!(
            decode_frame(r#"{"cmd":"MacRemoved","mac":"nope"}"#),
            Err(FrameError::InvalidIdentity { .. })
        ));
        assert_eq!(
            decode_frame(r#"{"cmd":"MacRemoved","mac":"aa:bb:cc:dd:ee:ff"}"#).unwrap(),
            InboundFrame::MacRemoved { mac: mac("AABBCCDDEEFF") }
        );
    }

    #[test]
    fn test_decode_anchor_coords_coerces_and_skips() {
        let text = r#"{"cmd":"AnchorCoords","mapId":"m1","items":[
            {"mac":"AA:BB:CC:DD:EE:FF","x":"1.5","y":2},
            {"x":3,"y":4},
            {"mac":"11:22:33:44:55:66","x":null,"y":"abc"}
        ]}"#;

        let frame = decode_frame(text).unwrap();

        assert_eq!(
            frame,
            InboundFrame::AnchorCoords {
                map_id: "m1".into(),
                items: vec![
                    AnchorCoord { mac: mac("AA:BB:CC:DD:EE:FF"), x: 1.5, y: 2.0 },
                    AnchorCoord { mac: mac("11:22:33:44:55:66"), x: 0.0, y: 0.0 },
                ],
            }
        );
    }

    #[test]
    fn test_decode_relay_located_engine_shape() {
        let text = r#"{"cmd":"RelayLocated","relay_mac":"C3:00:00:30:94:F9","dev_type":"MBT02",
            "x":3.012,"y":6.1,"rssi":-71,
            "anchors":[{"gmac":"A0:11:22:33:44:00","distance":3.2,"rssi":-55},{"gmac":"bad"}],
            "timestamp":1700000000000}"#;

        let InboundFrame::RelayLocated(obs) = decode_frame(text).unwrap() else {
            panic!("expected RelayLocated");
        };

        assert_eq!(obs.map_id, DEFAULT_MAP_ID);
        assert_eq!(obs.target_id, mac("C3:00:00:30:94:F9"));
        assert_eq!(obs.device_type, "MBT02");
        assert_eq!(obs.signal, -71);
        assert_eq!(obs.anchors.len(), 1);
        assert_eq!(obs.anchors[0].rssi, -55);
        assert_eq!(obs.timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn test_decode_relay_located_camel_case_aliases() {
        let text = r#"{"cmd":"RelayLocated","mapId":"m2","targetId":"c300003094f9",
            "deviceType":"MWC01","x":"1","y":"2","signal":-60}"#;

        let InboundFrame::RelayLocated(obs) = decode_frame(text).unwrap() else {
            panic!("expected RelayLocated");
        };

        assert_eq!(obs.map_id, "m2");
        assert_eq!(obs.device_type, "MWC01");
        assert_eq!((obs.x, obs.y, obs.signal), (1.0, 2.0, -60));
        assert!(obs.anchors.is_empty());
        assert_eq!(obs.timestamp, None);
    }

    #[test]
    fn test_decode_relay_located_requires_target() {
        assert!(matches!(
            decode_frame(r#"{"cmd":"RelayLocated","x":1,"y":2}"#),
            Err(FrameError::MissingField { field: "relay_mac", .. })
        ));
    }

    #[test]
    fn test_decode_telemetry_without_cmd() {
        let text = r#"{"raw":{"mac":"C3:00:00:24:0A:0B","rssi":-48,"len":10,"data":"01 02","type":"beacon"},"parsed":null}"#;

        let InboundFrame::Telemetry(rec) = decode_frame(text).unwrap() else {
            panic!("expected Telemetry");
        };

        assert_eq!(rec.id, mac("C3:00:00:24:0A:0B"));
        assert_eq!(rec.signal, -48);
        assert_eq!(rec.len, 10);
        assert_eq!(rec.kind.as_deref(), Some("beacon"));
        assert_eq!(rec.parsed_kind(), ParsedKind::None);
    }

    #[test]
    fn test_decode_telemetry_keeps_parsed_block() {
        let text = r#"{"raw":{"mac":"C3:00:00:30:01:02","rssi":-60,"len":27,"data":"AA"},
            "parsed":{"type":"relay","count":2,"relays":[]}}"#;

        let InboundFrame::Telemetry(rec) = decode_frame(text).unwrap() else {
            panic!("expected Telemetry");
        };

        assert_eq!(rec.parsed_kind(), ParsedKind::Relay);
        assert_eq!(rec.kind, None);
    }

    #[test]
    fn test_decode_telemetry_raw_must_be_object() {
        assert!(matches!(
            decode_frame(r#"{"raw":"AABB"}"#),
            Err(FrameError::MissingField { field: "raw", .. })
        ));
    }

    #[test]
    fn test_encode_set_anchor_coord_uses_camel_case() {
        let frame = OutboundFrame::SetAnchorCoord {
            map_id: "m1".into(),
            mac: mac("aabbccddeeff"),
            x: 1.5,
            y: 2.0,
        };

        let value: Value = serde_json::from_str(&encode_frame(&frame).unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"cmd":"SetAnchorCoord","mapId":"m1","mac":"AA:BB:CC:DD:EE:FF","x":1.5,"y":2.0})
        );
    }

    #[test]
    fn test_encode_unit_command_has_only_cmd() {
        assert_eq!(
            encode_frame(&OutboundFrame::GetMapList).unwrap(),
            r#"{"cmd":"GetMapList"}"#
        );
    }
}
