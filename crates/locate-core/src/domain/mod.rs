//! Domain entities for the locate console.
//!
//! Nothing in here performs I/O.  Code in outer layers (the console's stores,
//! the transport, the operator command loop) depends on the domain, but the
//! domain never depends on them.

/// Two-point scale calibration state machine.
pub mod calibration;

/// Image-to-container fitting and world ↔ screen conversion.
///
/// See [`geometry::RenderGeometry`] for the main type.
pub mod geometry;

/// Canonical beacon identity tokens.
pub mod identity;

/// Plain records exchanged over the wire and kept by the stores.
pub mod model;
