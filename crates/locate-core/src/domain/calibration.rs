//! Two-point scale calibration.
//!
//! The operator picks two points on the map image whose real-world distance
//! they know (for example both ends of a wall), then types that distance in
//! meters.  The pixel distance between the picks, measured in *native image
//! pixels* so the result does not depend on the current zoom, divided by the
//! meters gives the map's pixels-per-meter ratio.
//!
//! ```text
//!            begin (map loaded)          2nd click inside image
//!   Idle ─────────────────────▶ Active ───────────────────────▶ AwaitingDistance
//!    ▲                            │                                   │
//!    └────────── cancel ──────────┴──────── confirm / cancel ─────────┘
//! ```

use thiserror::Error;

use super::geometry::{round2, ImagePoint, RenderGeometry, ScreenPoint};

/// Errors produced by the calibration state machine.
#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    /// Calibration cannot start without a map image to click on.
    #[error("no map is loaded")]
    NoMapLoaded,

    /// A calibration is already running.
    #[error("calibration already in progress")]
    AlreadyActive,

    /// `confirm` was called before two points were picked.
    #[error("two points must be picked before entering a distance")]
    NotAwaitingDistance,

    /// The entered distance was zero, negative, or not a number.
    #[error("distance {0} m must be a finite number greater than zero")]
    InvalidDistance(f64),

    /// Both picks landed on the same pixel, so no ratio can be derived.
    #[error("the two calibration points are too close together")]
    DegeneratePoints,
}

/// One click recorded during calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickedPoint {
    /// Where the click landed in container pixels.
    pub screen: ScreenPoint,
    /// The same position in native image pixels.
    pub image: ImagePoint,
}

/// Current phase of a calibration session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CalibrationState {
    #[default]
    Idle,
    /// Collecting clicks; holds zero or one point.
    Active { points: Vec<PickedPoint> },
    /// Both points picked; waiting for the operator's distance in meters.
    AwaitingDistance {
        first: PickedPoint,
        second: PickedPoint,
        pixel_distance: f64,
    },
}

/// Result of feeding a click to [`CalibrationSession::click`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// Not calibrating, already waiting for a distance, or the click missed
    /// the rendered image.
    Ignored,
    /// A point was recorded; `count` points are held now.
    Recorded { count: usize },
    /// The second point was recorded.
    Completed { pixel_distance: f64 },
}

/// Transient calibration state for the active map.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSession {
    state: CalibrationState,
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, CalibrationState::Idle)
    }

    /// Idle → Active.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::NoMapLoaded`] when `map_loaded` is false;
    /// [`CalibrationError::AlreadyActive`] when a session is running.
    pub fn begin(&mut self, map_loaded: bool) -> Result<(), CalibrationError> {
        if !map_loaded {
            return Err(CalibrationError::NoMapLoaded);
        }
        if !self.is_idle() {
            return Err(CalibrationError::AlreadyActive);
        }
        self.state = CalibrationState::Active { points: Vec::with_capacity(2) };
        Ok(())
    }

    /// Records a click at `screen` if it lands on the rendered image.
    pub fn click(&mut self, screen: ScreenPoint, geometry: &RenderGeometry) -> ClickOutcome {
        let CalibrationState::Active { points } = &mut self.state else {
            return ClickOutcome::Ignored;
        };
        if !geometry.contains(screen) {
            return ClickOutcome::Ignored;
        }

        points.push(PickedPoint {
            screen,
            image: geometry.screen_to_image(screen),
        });

        if points.len() < 2 {
            return ClickOutcome::Recorded { count: points.len() };
        }

        let first = points[0];
        let second = points[1];
        let pixel_distance = first.image.distance_to(&second.image);
        self.state = CalibrationState::AwaitingDistance {
            first,
            second,
            pixel_distance,
        };
        ClickOutcome::Completed { pixel_distance }
    }

    /// Resolves the session into a pixels-per-meter ratio rounded to two
    /// decimals and returns to Idle.
    ///
    /// On error the session is left untouched so the operator can retry.
    ///
    /// # Errors
    ///
    /// See [`CalibrationError`].
    pub fn confirm(&mut self, meters: f64) -> Result<f64, CalibrationError> {
        let CalibrationState::AwaitingDistance { pixel_distance, .. } = self.state else {
            return Err(CalibrationError::NotAwaitingDistance);
        };
        if !meters.is_finite() || meters <= 0.0 {
            return Err(CalibrationError::InvalidDistance(meters));
        }

        let ratio = round2(pixel_distance / meters);
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(CalibrationError::DegeneratePoints);
        }

        self.state = CalibrationState::Idle;
        Ok(ratio)
    }

    /// Discards all session state.
    pub fn cancel(&mut self) {
        self.state = CalibrationState::Idle;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
