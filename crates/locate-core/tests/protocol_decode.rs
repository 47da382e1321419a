//! Integration tests for the locate-core frame codec.
//!
//! These decode the exact payload shapes the locate engine and the gateway
//! forwarder put on the wire, through the public API only.

use locate_core::{
    decode_frame, decode_payload, encode_frame, AnchorCoord, FrameError, InboundFrame, MacAddress,
    OutboundFrame, ParsedKind, DEFAULT_MAP_ID,
};

fn mac(s: &str) -> MacAddress {
    MacAddress::parse(s).expect("fixture mac must parse")
}

#[test]
fn test_anchor_positions_frame_yields_single_anchor() {
    // Arrange
    let text = r#"{"cmd":"AnchorCoords","mapId":"m1","items":[{"mac":"AA:BB:CC:DD:EE:FF","x":1,"y":2}]}"#;

    // Act
    let frame = decode_frame(text).expect("decode must succeed");

    // Assert
    assert_eq!(
        frame,
        InboundFrame::AnchorCoords {
            map_id: "m1".to_string(),
            items: vec![AnchorCoord { mac: mac("AA:BB:CC:DD:EE:FF"), x: 1.0, y: 2.0 }],
        }
    );
}

#[test]
fn test_map_list_entries_keep_optional_ratio() {
    let text = r#"{"cmd":"MapList","maps":[
        {"id":"m1","name":"Floor 1","file":"f1.png","url":"/maps/f1.png","ratio":32.5},
        {"id":2,"file":"f2.png","url":"/maps/f2.png"},
        "garbage",
        {"name":"no id"}
    ]}"#;

    let InboundFrame::MapList { maps } = decode_frame(text).expect("decode must succeed") else {
        panic!("expected MapList");
    };

    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0].ratio, Some(32.5));
    assert_eq!(maps[1].id, "2");
    assert_eq!(maps[1].name, "2", "name falls back to id");
    assert_eq!(maps[1].ratio, None);
}

#[test]
fn test_map_list_without_array_is_malformed() {
    let result = decode_frame(r#"{"cmd":"MapList","maps":{"id":"m1"}}"#);
    assert!(matches!(result, Err(FrameError::NotAnArray { field: "maps", .. })));
}

#[test]
fn test_locate_engine_frame_defaults_map_id() {
    let text = r#"{"cmd":"RelayLocated","relay_mac":"C3:00:00:30:94:F9","dev_type":"MBT02",
        "x":0.0,"y":10.0,"rssi":-80,"anchors":[],"timestamp":1}"#;

    let InboundFrame::RelayLocated(obs) = decode_frame(text).expect("decode must succeed") else {
        panic!("expected RelayLocated");
    };

    assert_eq!(obs.map_id, DEFAULT_MAP_ID);
    assert_eq!(obs.target_id.to_string(), "C3:00:00:30:94:F9");
}

#[test]
fn test_relay_located_anchors_must_be_array() {
    let text = r#"{"cmd":"RelayLocated","relay_mac":"C3:00:00:30:94:F9","anchors":"none"}"#;
    assert!(matches!(
        decode_frame(text),
        Err(FrameError::NotAnArray { field: "anchors", .. })
    ));
}

#[test]
fn test_gateway_combo_frame_decodes_as_telemetry() {
    let text = r#"{"raw":{"mac":"C3:00:00:30:AB:CD","rssi":-41,"len":23,"data":"00 11"},
        "parsed":{"type":"combo","vendor":1,"mac":"01:02:03:04:05:06","battery":88,"product":8,"tamper":0}}"#;

    let frame = decode_payload(text.as_bytes()).expect("decode must succeed");

    let InboundFrame::Telemetry(record) = frame else {
        panic!("expected Telemetry");
    };
    assert_eq!(record.parsed_kind(), ParsedKind::Combo);
    assert_eq!(record.len, 23);
}

#[test]
fn test_unknown_command_round_trips_its_tag() {
    let frame = decode_frame(r#"{"cmd":"FirmwareStatus"}"#).expect("decode must succeed");
    assert_eq!(frame.tag(), "FirmwareStatus");
}

#[test]
fn test_outbound_remove_mac_carries_canonical_token() {
    let text = encode_frame(&OutboundFrame::RemoveMac { mac: mac("c3-00-00-24-0a-0b") })
        .expect("encode must succeed");
    assert_eq!(text, r#"{"cmd":"RemoveMac","mac":"C3:00:00:24:0A:0B"}"#);
}
