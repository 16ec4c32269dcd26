//! Render surfaces
//!
//! The hit resolver never reads layout directly; it asks a
//! [`RenderSurface`] where a target ended up on screen. Two surfaces exist:
//! - [`ProjectedSurface`]: computes the browser's perspective projection
//!   headlessly (native demo, tests)
//! - `DomSurface` (wasm32 only): reads `getBoundingClientRect` of the
//!   target's element

#[cfg(target_arch = "wasm32")]
pub mod dom;

#[cfg(target_arch = "wasm32")]
pub use dom::DomSurface;

use crate::consts::PERSPECTIVE;
use crate::sim::{RenderSurface, ScreenGeometry, Target};

/// Headless stand-in for the page layout
///
/// Targets are drawn at their top-left position with a box of the visible
/// size, then pushed back by `perspective(1000px) translateZ(-z)` about the
/// box centre. The centre therefore stays put and the box scales by
/// `1000 / (1000 + z)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectedSurface;

impl ProjectedSurface {
    pub fn scale(z: Option<f32>) -> f32 {
        z.map_or(1.0, |z| PERSPECTIVE / (PERSPECTIVE + z))
    }
}

impl RenderSurface for ProjectedSurface {
    fn screen_geometry(&self, target: &Target) -> Option<ScreenGeometry> {
        let radius = target.visible_size() / 2.0 * Self::scale(target.z);
        Some(ScreenGeometry {
            center: target.center(),
            radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Direction, TargetId};
    use glam::Vec2;

    fn target(z: Option<f32>) -> Target {
        Target {
            id: TargetId::new("t"),
            pos: Vec2::new(100.0, 50.0),
            z,
            size: 40.0,
            speed: 1.0,
            direction: Direction::default(),
        }
    }

    #[test]
    fn test_flat_target_is_unscaled() {
        let geo = ProjectedSurface.screen_geometry(&target(None)).unwrap();
        assert_eq!(geo.center, Vec2::new(120.0, 70.0));
        assert_eq!(geo.radius, 20.0);
    }

    #[test]
    fn test_depth_shrinks_radius_about_centre() {
        let t = target(Some(250.0));
        // visible 30, projected by 1000/1250
        let geo = ProjectedSurface.screen_geometry(&t).unwrap();
        assert_eq!(geo.center, Vec2::new(115.0, 65.0));
        assert!((geo.radius - 12.0).abs() < 1e-4);
    }
}
