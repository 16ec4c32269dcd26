//! Game state definitions

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aim::Aim;
use super::session::{Session, SessionPhase};
use super::spawner::Spawner;
use super::target::{Target, TargetId, Viewport};
use crate::backend::SessionReport;
use crate::tuning::{Difficulty, GameMode};

/// Things that happened during a tick, drained by the host for feedback
/// and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started {
        difficulty: Difficulty,
        game_mode: GameMode,
    },
    Spawned(TargetId),
    Hit {
        id: TargetId,
        point: Vec2,
    },
    Miss {
        point: Vec2,
    },
    Paused,
    Resumed,
    /// Countdown expired; the report is ready for submission
    Ended {
        report: SessionReport,
    },
    /// Abandoned by the player; nothing is reported
    Quit,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub session: Session,
    pub spawner: Spawner,
    pub aim: Aim,
    pub viewport: Viewport,
    /// Game clock in ms, monotonic, drives the cache throttle
    pub clock_ms: f64,
    pub time_ticks: u64,
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle game state with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            session: Session::new(),
            spawner: Spawner::new(Difficulty::default(), GameMode::default(), seed),
            aim: Aim::default(),
            viewport: Viewport::default(),
            clock_ms: 0.0,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    pub fn targets(&self) -> &[Target] {
        self.spawner.targets()
    }

    /// Begin a session. `now_ms` is the host wall clock (ms since the Unix
    /// epoch) and only feeds the report timestamps.
    pub fn start_game(&mut self, difficulty: Difficulty, game_mode: GameMode, now_ms: f64) {
        self.spawner.configure(difficulty, game_mode);
        self.aim.reset();
        self.session.start_game(difficulty, game_mode, now_ms);
        self.events.push(GameEvent::Started {
            difficulty,
            game_mode,
        });
        self.seed_targets();
    }

    /// Seed the live set if it is empty. Only meaningful while active.
    pub(crate) fn seed_targets(&mut self) {
        if self.spawner.activate(self.viewport) > 0 {
            for target in self.spawner.targets() {
                self.events.push(GameEvent::Spawned(target.id.clone()));
            }
        }
    }

    /// Tear down targets and cached geometry after a session stops
    pub(crate) fn clear_field(&mut self) {
        self.spawner.clear();
        self.aim.reset();
    }

    /// Leave the results screen for the menu
    pub fn return_to_idle(&mut self) {
        self.session.return_to_idle();
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(7);
        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(state.targets().is_empty());
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_start_game_seeds_targets() {
        let mut state = GameState::new(7);
        state.start_game(Difficulty::Easy, GameMode::TwoD, 0.0);
        assert_eq!(state.phase(), SessionPhase::Active);
        assert_eq!(state.targets().len(), 2);

        let events = state.drain_events();
        assert!(matches!(events[0], GameEvent::Started { .. }));
        let spawned = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Spawned(_)))
            .count();
        assert_eq!(spawned, 2);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_restart_replaces_targets() {
        let mut state = GameState::new(7);
        state.start_game(Difficulty::Hard, GameMode::ThreeD, 0.0);
        let first: Vec<_> = state.targets().iter().map(|t| t.id.clone()).collect();
        state.session.quit_game();
        state.clear_field();
        state.start_game(Difficulty::Hard, GameMode::ThreeD, 0.0);
        assert_eq!(state.targets().len(), 2);
        assert!(state.targets().iter().all(|t| !first.contains(&t.id)));
        assert!(state.targets().iter().all(|t| t.z.is_some()));
    }
}
