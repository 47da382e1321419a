//! Render geometry: fitting a map image into its container and converting
//! between metric world coordinates and container pixels.
//!
//! Three coordinate spaces are involved:
//!
//! ```text
//! world   meters, x right, y up, origin at the image's bottom-left corner
//! image   native image pixels, x right, y down, origin top-left
//! screen  container pixels, x right, y down, origin top-left
//! ```
//!
//! A map's scale ratio ([`PixelsPerMeter`]) links world and image space.
//! [`RenderGeometry`] links image and screen space: the image is scaled by
//! `scale` and its top-left corner sits at `(offset_x, offset_y)` inside the
//! container.  With [`FitMode::Contain`] the offsets are zero or positive
//! (letterbox bars); with [`FitMode::Cover`] they are zero or negative (the
//! image overflows and is cropped).  The crop offset used by the vertical
//! conversion is therefore `-offset_y`:
//!
//! ```text
//! screen_y = rendered_height − world_y · ratio · scale − crop_offset_y
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while computing or using render geometry.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// The image has a zero, negative, or non-finite dimension.
    #[error("image size {width}x{height} is not drawable")]
    EmptyImage { width: f64, height: f64 },

    /// The container has a zero, negative, or non-finite dimension.
    #[error("container size {width}x{height} is not drawable")]
    EmptyContainer { width: f64, height: f64 },

    /// A scale ratio was zero, negative, or non-finite.
    #[error("pixels-per-meter ratio {0} must be finite and positive")]
    InvalidRatio(f64),

    /// An unrecognised fit mode name.
    #[error("unknown fit mode {0:?}; expected \"contain\" or \"cover\"")]
    UnknownFitMode(String),
}

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns `true` when both dimensions are finite and strictly positive.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A point in container pixels (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in native image pixels (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other` in native pixels.
    pub fn distance_to(&self, other: &ImagePoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A point in world meters (origin bottom-left, y up).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rounds both coordinates to two decimals (centimeter resolution).
    pub fn rounded(&self) -> WorldPoint {
        WorldPoint {
            x: round2(self.x),
            y: round2(self.y),
        }
    }
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// How the map image is fitted into its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fit the whole image, letterboxing the spare axis.
    #[default]
    Contain,
    /// Fill the container, cropping the overflowing axis.
    Cover,
}

impl FromStr for FitMode {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contain" => Ok(FitMode::Contain),
            "cover" => Ok(FitMode::Cover),
            other => Err(GeometryError::UnknownFitMode(other.to_string())),
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMode::Contain => f.write_str("contain"),
            FitMode::Cover => f.write_str("cover"),
        }
    }
}

/// A validated map scale: native image pixels per world meter.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PixelsPerMeter(f64);

impl PixelsPerMeter {
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidRatio`] unless `value` is finite and > 0.
    pub fn new(value: f64) -> Result<Self, GeometryError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(GeometryError::InvalidRatio(value))
        }
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

/// Where and how large the map image is drawn inside its container.
///
/// Derived and ephemeral: recompute it with [`RenderGeometry::compute`]
/// whenever the image or the container changes size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderGeometry {
    /// Container pixels per native image pixel.
    pub scale: f64,
    /// X of the rendered image's top-left corner in container pixels.
    pub offset_x: f64,
    /// Y of the rendered image's top-left corner in container pixels.
    pub offset_y: f64,
    /// Width of the scaled image in container pixels.
    pub rendered_width: f64,
    /// Height of the scaled image in container pixels.
    pub rendered_height: f64,
    /// The container the image was fitted into.
    pub container: Size,
}

impl RenderGeometry {
    /// Fits `image` (native pixels) into `container` (pixels) and centers it.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyImage`] or [`GeometryError::EmptyContainer`]
    /// when either size is not drawable.
    pub fn compute(image: Size, container: Size, mode: FitMode) -> Result<Self, GeometryError> {
        if !image.is_drawable() {
            return Err(GeometryError::EmptyImage {
                width: image.width,
                height: image.height,
            });
        }
        if !container.is_drawable() {
            return Err(GeometryError::EmptyContainer {
                width: container.width,
                height: container.height,
            });
        }

        let sx = container.width / image.width;
        let sy = container.height / image.height;
        let scale = match mode {
            FitMode::Contain => sx.min(sy),
            FitMode::Cover => sx.max(sy),
        };

        let rendered_width = image.width * scale;
        let rendered_height = image.height * scale;

        Ok(Self {
            scale,
            offset_x: (container.width - rendered_width) / 2.0,
            offset_y: (container.height - rendered_height) / 2.0,
            rendered_width,
            rendered_height,
            container,
        })
    }

    /// Vertical crop of a covered image (positive when the top is cut off).
    pub fn crop_offset_y(&self) -> f64 {
        -self.offset_y
    }

    /// The visible part of the rendered image, as `(left, top, right, bottom)`.
    ///
    /// For contained images this is the rendered rectangle; for covered
    /// images it is clipped to the container.
    fn visible_bounds(&self) -> (f64, f64, f64, f64) {
        let left = self.offset_x.max(0.0);
        let top = self.offset_y.max(0.0);
        let right = (self.offset_x + self.rendered_width).min(self.container.width);
        let bottom = (self.offset_y + self.rendered_height).min(self.container.height);
        (left, top, right, bottom)
    }

    /// Returns `true` when `p` falls on the visible part of the image.
    pub fn contains(&self, p: ScreenPoint) -> bool {
        let (left, top, right, bottom) = self.visible_bounds();
        p.x >= left && p.x <= right && p.y >= top && p.y <= bottom
    }

    /// Clamps `p` onto the visible part of the image.
    pub fn clamp(&self, p: ScreenPoint) -> ScreenPoint {
        let (left, top, right, bottom) = self.visible_bounds();
        ScreenPoint {
            x: p.x.clamp(left, right),
            y: p.y.clamp(top, bottom),
        }
    }

    /// Container pixels → native image pixels.
    pub fn screen_to_image(&self, p: ScreenPoint) -> ImagePoint {
        ImagePoint {
            x: (p.x - self.offset_x) / self.scale,
            y: (p.y - self.offset_y) / self.scale,
        }
    }

    /// Native image pixels → container pixels.
    pub fn image_to_screen(&self, p: ImagePoint) -> ScreenPoint {
        ScreenPoint {
            x: self.offset_x + p.x * self.scale,
            y: self.offset_y + p.y * self.scale,
        }
    }

    /// World meters → container pixels.
    pub fn world_to_screen(&self, w: WorldPoint, ratio: PixelsPerMeter) -> ScreenPoint {
        let k = ratio.get() * self.scale;
        ScreenPoint {
            x: self.offset_x + w.x * k,
            y: self.rendered_height - w.y * k - self.crop_offset_y(),
        }
    }

    /// Container pixels → world meters.
    pub fn screen_to_world(&self, p: ScreenPoint, ratio: PixelsPerMeter) -> WorldPoint {
        let k = ratio.get() * self.scale;
        WorldPoint {
            x: (p.x - self.offset_x) / k,
            y: (self.rendered_height - self.crop_offset_y() - p.y) / k,
        }
    }

    /// Like [`screen_to_world`](Self::screen_to_world) but clamps the pointer
    /// onto the visible image first, so a drag can never leave the map.
    pub fn screen_to_world_clamped(&self, p: ScreenPoint, ratio: PixelsPerMeter) -> WorldPoint {
        self.screen_to_world(self.clamp(p), ratio)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
