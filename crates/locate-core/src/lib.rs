//! # locate-core
//!
//! Shared library for the BLE locate console containing the wire protocol
//! codec, the domain value types, and the map coordinate geometry.
//!
//! It has zero dependencies on sockets, async runtimes, or UI frameworks, so
//! everything here can be unit-tested without a server.
//!
//! # Architecture overview
//!
//! The console shows anchors, locate results, and raw BLE telemetry on top of
//! site map images.  Two kinds of coordinates are in play all the time:
//!
//! - **World coordinates** in meters (x right, y up, origin bottom-left), which
//!   is what the locate engine and the anchor database speak.
//! - **Screen coordinates** in container pixels (origin top-left, y down),
//!   which is what pointer events and drawing speak.
//!
//! This crate defines:
//!
//! - **`protocol`** – How frames travel over the WebSocket.  Inbound JSON text
//!   is decoded once, at the transport boundary, into a closed
//!   [`InboundFrame`] enum; outbound commands are the [`OutboundFrame`] enum.
//!
//! - **`domain`** – Pure business logic: canonical beacon identity tokens
//!   ([`MacAddress`]), the render geometry that maps world ↔ screen
//!   ([`RenderGeometry`]), the two-point scale calibration state machine
//!   ([`CalibrationSession`]), and the plain records stored by the console.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `locate_core::RenderGeometry` instead of the full module path.
pub use domain::calibration::{CalibrationError, CalibrationSession, CalibrationState, ClickOutcome};
pub use domain::geometry::{
    FitMode, GeometryError, ImagePoint, PixelsPerMeter, RenderGeometry, ScreenPoint, Size,
    WorldPoint,
};
pub use domain::identity::{IdentityError, MacAddress};
pub use domain::model::{
    AnchorCoord, AnchorObservation, LocateObservation, MapInfo, ParsedKind, TelemetryRecord,
    DEFAULT_MAP_ID,
};
pub use protocol::codec::{decode_frame, decode_payload, encode_frame, FrameError};
pub use protocol::frames::{InboundFrame, OutboundFrame};
