#![forbid(unsafe_code)]

//! Placement values for board entities.
//!
//! [`TransformState`] is `Copy`: every read hands out an independent value,
//! so a snapshot taken before an edit can never observe later edits to the
//! live entity.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D point on the board, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Position, size, rotation and scale of an entity.
///
/// Rotation is in degrees, clockwise. Scale factors default to `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransformState {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl TransformState {
    /// Create an unrotated, unscaled transform.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set both scale factors.
    #[must_use]
    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Move the position, keeping size, rotation and scale.
    #[must_use]
    pub fn moved_to(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    #[must_use]
    pub fn position(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Every component is finite (no NaN or infinity).
    #[must_use]
    pub fn is_finite(self) -> bool {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.rotation,
            self.scale_x,
            self.scale_y,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
