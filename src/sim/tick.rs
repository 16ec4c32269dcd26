//! Fixed timestep simulation tick
//!
//! One call is one animation frame. The session phase is checked at the top;
//! a paused or finished session does no spawning, motion or hit-testing.

use glam::Vec2;

use super::aim::RenderSurface;
use super::state::{GameEvent, GameState};
use super::target::Viewport;
use crate::consts::*;

/// Ticks between auto-aim shots in idle mode
const BOT_SHOT_TICKS: u64 = 30;
/// Every n-th auto-aim shot is deliberately wide
const BOT_MISS_EVERY: u64 = 4;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest pointer position in viewport pixels
    pub pointer: Option<Vec2>,
    /// Shots fired since the last tick, in order
    pub shots: Vec<Vec2>,
    /// Pause toggle
    pub pause: bool,
    /// Abandon the session without reporting
    pub quit: bool,
    /// New viewport size after a resize
    pub viewport: Option<Viewport>,
    /// Idle/demo mode - a bot aims and shoots
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, surface: &dyn RenderSurface, dt: f32) {
    let dt_ms = dt * 1000.0;
    state.time_ticks += 1;
    state.clock_ms += f64::from(dt_ms);

    if let Some(viewport) = input.viewport {
        state.viewport = viewport;
    }

    // Idle/demo mode - bot plays the game
    let mut input = input.clone();
    if input.idle_mode && state.session.is_active() {
        drive_bot(state, &mut input);
    }
    let input = &input;

    if let Some(pointer) = input.pointer {
        state.aim.move_pointer(pointer);
    }

    if input.quit {
        if state.session.quit_game() {
            state.clear_field();
            state.events.push(GameEvent::Quit);
        }
        return;
    }

    if input.pause && state.session.toggle_pause() {
        let event = if state.session.is_paused() {
            GameEvent::Paused
        } else {
            GameEvent::Resumed
        };
        state.events.push(event);
    }

    // Don't simulate unless active; paused time still runs the game clock
    if !state.session.is_active() {
        state.session.advance_clock(dt_ms);
        state
            .aim
            .update(state.clock_ms, state.spawner.targets(), surface, false);
        return;
    }

    state.seed_targets();

    // Shots use the snapshot from before this frame's motion
    for &point in &input.shots {
        resolve_shot(state, point);
    }

    let viewport = state.viewport;
    for target in state.spawner.targets_mut() {
        target.step(viewport);
    }

    state
        .aim
        .update(state.clock_ms, state.spawner.targets(), surface, true);

    let before = state.spawner.len();
    if state.spawner.advance_interval(dt_ms, viewport) > 0 {
        for target in &state.spawner.targets()[before..] {
            state.events.push(GameEvent::Spawned(target.id.clone()));
        }
    }

    if state.session.advance_clock(dt_ms) {
        if let Some(report) = state.session.end_game() {
            state.clear_field();
            state.events.push(GameEvent::Ended { report });
        }
    }
}

/// Score one shot: a hit removes the target and spawns its replacement
fn resolve_shot(state: &mut GameState, point: Vec2) {
    match state.aim.resolve_shot(point) {
        Some(id) if state.spawner.remove_target(&id) => {
            state.session.register_hit();
            log::debug!("Hit {} at ({:.0}, {:.0})", id, point.x, point.y);
            state.events.push(GameEvent::Hit { id, point });
            if let Some(new_id) = state.spawner.spawn_target(state.viewport, false) {
                state.events.push(GameEvent::Spawned(new_id));
            }
        }
        _ => {
            state.session.register_miss();
            log::debug!("Miss at ({:.0}, {:.0})", point.x, point.y);
            state.events.push(GameEvent::Miss { point });
        }
    }
}

/// Aim at the cached target nearest the pointer and fire on a fixed cadence
fn drive_bot(state: &GameState, input: &mut TickInput) {
    let pointer = state.aim.pointer;
    let Some(target) = state.aim.cache().entries().iter().min_by(|a, b| {
        a.distance_to(pointer)
            .partial_cmp(&b.distance_to(pointer))
            .unwrap_or(std::cmp::Ordering::Equal)
    }) else {
        return;
    };

    let center = Vec2::new(target.x, target.y);
    input.pointer = Some(center);

    if state.time_ticks % BOT_SHOT_TICKS == 0 {
        let shot_index = state.time_ticks / BOT_SHOT_TICKS;
        let point = if shot_index % BOT_MISS_EVERY == 0 {
            center + Vec2::splat(target.radius + NEAR_TARGET_RADIUS)
        } else {
            center
        };
        input.shots.push(point);
    }
}
