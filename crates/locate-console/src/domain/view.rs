//! The operator's active view.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which panel the operator is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    /// Anchor placement and scale calibration.
    #[default]
    Anchors,
    /// Live locate results.
    Locate,
    /// Raw gateway telemetry.
    Telemetry,
}

impl FromStr for ActiveView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anchors" => Ok(ActiveView::Anchors),
            "locate" => Ok(ActiveView::Locate),
            "telemetry" => Ok(ActiveView::Telemetry),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActiveView::Anchors => "anchors",
            ActiveView::Locate => "locate",
            ActiveView::Telemetry => "telemetry",
        };
        f.write_str(s)
    }
}
