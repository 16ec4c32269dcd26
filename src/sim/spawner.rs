//! Target spawner
//!
//! Owns the live target set. Only the spawner adds or removes targets;
//! motion and hit-testing borrow it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::target::{Direction, Target, TargetId, Viewport};
use crate::consts::*;
use crate::tuning::{Difficulty, DifficultyParams, GameMode};

/// Creates targets from difficulty parameters and keeps the live set
#[derive(Debug, Clone)]
pub struct Spawner {
    params: DifficultyParams,
    mode: GameMode,
    targets: Vec<Target>,
    rng: Pcg32,
    /// Monotonic counter mixed into ids so they never repeat within a run
    next_serial: u64,
    /// Milliseconds accumulated toward the next spawn attempt
    interval_elapsed_ms: f32,
}

impl Spawner {
    pub fn new(difficulty: Difficulty, mode: GameMode, seed: u64) -> Self {
        Self {
            params: difficulty.params(),
            mode,
            targets: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_serial: 1,
            interval_elapsed_ms: 0.0,
        }
    }

    /// Switch parameters for a new session; clears the live set
    pub fn configure(&mut self, difficulty: Difficulty, mode: GameMode) {
        self.params = difficulty.params();
        self.mode = mode;
        self.clear();
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut [Target] {
        &mut self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn max_targets(&self) -> usize {
        self.params.max_targets
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.targets.iter().any(|t| &t.id == id)
    }

    /// Spawn one target if below the cap and not paused
    pub fn spawn_target(&mut self, viewport: Viewport, paused: bool) -> Option<TargetId> {
        if paused || self.targets.len() >= self.params.max_targets {
            return None;
        }
        let target = self.generate_target(viewport);
        let id = target.id.clone();
        log::debug!(
            "Spawned target {} at ({:.0}, {:.0}) size {} speed {:.2}",
            id,
            target.pos.x,
            target.pos.y,
            target.size,
            target.speed
        );
        self.targets.push(target);
        Some(id)
    }

    /// Remove a target by id. Returns false if it was not live.
    pub fn remove_target(&mut self, id: &TargetId) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| &t.id != id);
        self.targets.len() != before
    }

    /// Seed an empty live set for an active session. Returns how many
    /// targets were created.
    pub fn activate(&mut self, viewport: Viewport) -> usize {
        if !self.targets.is_empty() {
            return 0;
        }
        let seed_count = INITIAL_TARGETS.min(self.params.max_targets);
        for _ in 0..seed_count {
            let target = self.generate_target(viewport);
            self.targets.push(target);
        }
        log::debug!("Seeded {} targets", seed_count);
        seed_count
    }

    /// Advance the spawn interval by `dt_ms`, attempting one spawn per
    /// elapsed interval. Only called while the session is running.
    pub fn advance_interval(&mut self, dt_ms: f32, viewport: Viewport) -> usize {
        self.interval_elapsed_ms += dt_ms;
        let mut spawned = 0;
        while self.interval_elapsed_ms >= self.params.spawn_interval_ms {
            self.interval_elapsed_ms -= self.params.spawn_interval_ms;
            if self.spawn_target(viewport, false).is_some() {
                spawned += 1;
            }
        }
        spawned
    }

    /// Drop every live target and restart the interval
    pub fn clear(&mut self) {
        self.targets.clear();
        self.interval_elapsed_ms = 0.0;
    }

    fn generate_target(&mut self, viewport: Viewport) -> Target {
        let (size_min, size_max) = self.params.size_range;
        let mut size = self.rng.random_range(size_min..=size_max) as f32;
        if self.mode.is_3d() {
            size = (size * SIZE_SCALE_3D).floor();
        }

        let (speed_min, speed_max) = self.params.speed_range;
        let speed = self.rng.random_range(speed_min..speed_max);

        let z = self
            .mode
            .is_3d()
            .then(|| self.rng.random_range(Z_MIN..Z_MAX));

        // Keep 2x size clear of every edge so a new target never clips
        let margin = size * 2.0;
        let span = Vec2::new(
            (viewport.width - margin * 2.0).max(0.0),
            (viewport.height - margin * 2.0).max(0.0),
        );
        let pos = Vec2::new(
            self.rng.random::<f32>() * span.x + margin,
            self.rng.random::<f32>() * span.y + margin,
        );

        let direction = Direction {
            x: self.random_sign(),
            y: self.random_sign(),
            z: self.random_sign(),
        };

        let mut target = Target {
            id: self.next_id(),
            pos,
            z,
            size,
            speed,
            direction,
        };
        let max = viewport.max_position(target.visible_size());
        target.pos = target.pos.min(max).max(Vec2::ZERO);
        target
    }

    fn random_sign(&mut self) -> f32 {
        if self.rng.random_bool(0.5) { 1.0 } else { -1.0 }
    }

    fn next_id(&mut self) -> TargetId {
        let serial = self.next_serial;
        self.next_serial += 1;
        let salt = u64::from(self.rng.random::<u32>());
        TargetId::new(format!("{}-{}", base36(serial), base36(salt)))
    }
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
