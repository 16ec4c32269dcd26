//! Aim and hit resolution
//!
//! Hit-testing works on a cached snapshot of where targets are actually
//! drawn, not their logical positions: a 3D perspective transform moves the
//! rendered box. The cache is rebuilt from a [`RenderSurface`] at most once
//! per [`CACHE_REFRESH_MS`], while the pointer itself is tracked on every
//! event.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::target::{Target, TargetId};
use crate::consts::*;

/// Rendered centre and radius of a target in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    pub center: Vec2,
    pub radius: f32,
}

/// Where targets actually end up on screen
pub trait RenderSurface {
    /// Rendered geometry of `target`, or `None` if the surface has no
    /// element for it (not yet laid out, already removed)
    fn screen_geometry(&self, target: &Target) -> Option<ScreenGeometry>;
}

/// One cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedGeometry {
    pub id: TargetId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl CachedGeometry {
    pub fn new(id: impl Into<TargetId>, x: f32, y: f32, radius: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            radius,
        }
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        Vec2::new(self.x, self.y).distance(point)
    }
}

/// Crosshair feedback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Proximity {
    #[default]
    Default,
    NearTarget,
    OnTarget,
}

impl Proximity {
    /// CSS class used by the crosshair element
    pub fn as_str(&self) -> &'static str {
        match self {
            Proximity::Default => "default",
            Proximity::NearTarget => "near-target",
            Proximity::OnTarget => "on-target",
        }
    }
}

/// Throttled snapshot of rendered target geometry, in target insertion order
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    entries: Vec<CachedGeometry>,
    last_refresh_ms: Option<f64>,
}

impl GeometryCache {
    /// Cache built directly from entries (headless hosts, tests)
    pub fn from_entries(entries: Vec<CachedGeometry>) -> Self {
        Self {
            entries,
            last_refresh_ms: None,
        }
    }

    pub fn entries(&self) -> &[CachedGeometry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild from the surface unless the last rebuild was under
    /// [`CACHE_REFRESH_MS`] ago. Returns true if a rebuild happened.
    pub fn refresh(&mut self, now_ms: f64, targets: &[Target], surface: &dyn RenderSurface) -> bool {
        if self
            .last_refresh_ms
            .is_some_and(|last| now_ms - last < CACHE_REFRESH_MS)
        {
            return false;
        }
        self.last_refresh_ms = Some(now_ms);
        self.entries = targets
            .iter()
            .filter_map(|target| {
                surface.screen_geometry(target).map(|geo| CachedGeometry {
                    id: target.id.clone(),
                    x: geo.center.x,
                    y: geo.center.y,
                    radius: geo.radius,
                })
            })
            .collect();
        true
    }

    /// Drop one entry (the target was removed since the snapshot)
    pub fn evict(&mut self, id: &TargetId) {
        self.entries.retain(|e| &e.id != id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_refresh_ms = None;
    }

    /// First entry, in cache order, whose radius contains `point`
    ///
    /// This is first-match, not closest-match: an earlier overlapping target
    /// takes the hit.
    pub fn resolve_hit(&self, point: Vec2) -> Option<&TargetId> {
        self.entries
            .iter()
            .find(|e| e.distance_to(point) <= e.radius)
            .map(|e| &e.id)
    }

    pub fn proximity(&self, point: Vec2) -> Proximity {
        let mut closest = f32::INFINITY;
        for entry in &self.entries {
            let distance = entry.distance_to(point);
            if distance <= entry.radius {
                return Proximity::OnTarget;
            }
            closest = closest.min(distance);
        }
        if closest <= NEAR_TARGET_RADIUS {
            Proximity::NearTarget
        } else {
            Proximity::Default
        }
    }
}

/// Crosshair state plus the geometry cache it reads
#[derive(Debug, Clone, Default)]
pub struct Aim {
    pub pointer: Vec2,
    pub proximity: Proximity,
    cache: GeometryCache,
}

impl Aim {
    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    /// Track the pointer immediately; hit-test cost is paid in [`Aim::update`]
    pub fn move_pointer(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }

    /// Refresh the cache (throttled) and reclassify the crosshair.
    ///
    /// `engaged` is false while the session is not running; the crosshair
    /// then reads `Default` and no surface lookups happen.
    pub fn update(
        &mut self,
        now_ms: f64,
        targets: &[Target],
        surface: &dyn RenderSurface,
        engaged: bool,
    ) {
        if !engaged || targets.is_empty() {
            self.proximity = Proximity::Default;
            return;
        }
        if self.cache.refresh(now_ms, targets, surface) {
            self.proximity = self.cache.proximity(self.pointer);
        }
    }

    /// Resolve a shot against the current snapshot. A hit target is evicted
    /// so the same snapshot cannot score it twice.
    pub fn resolve_shot(&mut self, point: Vec2) -> Option<TargetId> {
        let hit = self.cache.resolve_hit(point).cloned()?;
        self.cache.evict(&hit);
        Some(hit)
    }

    pub fn reset(&mut self) {
        self.cache.clear();
        self.proximity = Proximity::Default;
    }
}
