//! Target entities and per-frame motion
//!
//! Each target moves independently: per-axis direction signs, a constant
//! speed, and bounce-on-boundary reflection. 3D targets also travel in depth
//! and shrink/fade with distance.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Opaque target identifier, unique for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Visible play area in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Largest top-left position that keeps a target of `visible` diameter
    /// on screen (never negative)
    pub fn max_position(&self, visible: f32) -> Vec2 {
        Vec2::new(
            (self.width - visible).max(0.0),
            (self.height - visible).max(0.0),
        )
    }
}

/// Per-axis travel sign; each component is +1.0 or -1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Direction {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

/// A live, shootable target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    /// Top-left corner in viewport pixels
    pub pos: Vec2,
    /// Depth in [Z_MIN, Z_MAX]; `None` for 2D targets
    pub z: Option<f32>,
    /// Base diameter in pixels
    pub size: f32,
    /// Pixels per frame (depth travels at half speed)
    pub speed: f32,
    pub direction: Direction,
}

impl Target {
    /// Diameter after perspective shrink
    pub fn visible_size(&self) -> f32 {
        match self.z {
            Some(z) => self.size * (1.0 - z / PERSPECTIVE),
            None => self.size,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.z.map_or(1.0, |z| 1.0 - z / PERSPECTIVE)
    }

    /// Logical centre (ignores any rendering transform)
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.visible_size() / 2.0)
    }

    /// Advance one animation frame inside `viewport`
    ///
    /// Depth moves first so the x/y bounds use the visible size at the new
    /// depth. An axis whose candidate reaches or passes a bound is both
    /// clamped and reflected.
    pub fn step(&mut self, viewport: Viewport) {
        if let Some(z) = self.z {
            let candidate = z + self.direction.z * self.speed / 2.0;
            if candidate <= Z_MIN || candidate >= Z_MAX {
                self.direction.z = -self.direction.z;
            }
            self.z = Some(candidate.clamp(Z_MIN, Z_MAX));
        }

        let max = viewport.max_position(self.visible_size());
        let candidate = self.pos + Vec2::new(self.direction.x, self.direction.y) * self.speed;

        if candidate.x <= 0.0 || candidate.x >= max.x {
            self.direction.x = -self.direction.x;
        }
        if candidate.y <= 0.0 || candidate.y >= max.y {
            self.direction.y = -self.direction.y;
        }

        // min before max: a viewport smaller than the target pins it at 0
        self.pos = candidate.min(max).max(Vec2::ZERO);
    }
}
