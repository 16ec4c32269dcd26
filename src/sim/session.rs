//! Session and score tracking
//!
//! Phase machine: `Idle -> Active -> {Paused <-> Active} -> Ended -> Idle`.
//! Scoring and the countdown only move while `Active`.

use serde::{Deserialize, Serialize};

use crate::backend::{SessionReport, timestamp_from_millis};
use crate::tuning::{Difficulty, GameMode};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Menu, no session
    #[default]
    Idle,
    /// Countdown running, shots count
    Active,
    /// Clock, motion and spawning frozen
    Paused,
    /// Finished (timeout or quit), waiting to return to the menu
    Ended,
}

/// Accuracy percentage, rounded; 0 before the first shot
pub fn accuracy(hits: u32, misses: u32) -> u32 {
    let shots = hits + misses;
    if shots == 0 {
        return 0;
    }
    (f64::from(hits) / f64::from(shots) * 100.0).round() as u32
}

/// One timed play-through
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub difficulty: Difficulty,
    pub game_mode: GameMode,
    pub phase: SessionPhase,
    pub score: u32,
    pub hits: u32,
    pub misses: u32,
    pub accuracy: u32,
    /// Countdown seconds remaining
    pub time_left: u32,
    /// Host wall clock at start (ms since the Unix epoch)
    pub started_at_ms: f64,
    /// Game-clock time since start, paused time included
    pub elapsed_ms: f64,
    /// Progress toward the next countdown second
    #[serde(default)]
    second_ms: f32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset counters and start the countdown
    pub fn start_game(&mut self, difficulty: Difficulty, game_mode: GameMode, now_ms: f64) {
        *self = Self {
            difficulty,
            game_mode,
            phase: SessionPhase::Active,
            time_left: difficulty.params().duration_secs,
            started_at_ms: now_ms,
            ..Self::default()
        };
        log::info!(
            "Session started: {} {} ({}s)",
            difficulty,
            game_mode,
            self.time_left
        );
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn is_paused(&self) -> bool {
        self.phase == SessionPhase::Paused
    }

    /// Active or paused
    pub fn in_progress(&self) -> bool {
        matches!(self.phase, SessionPhase::Active | SessionPhase::Paused)
    }

    /// Returns false if the hit was ignored (not active)
    pub fn register_hit(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        let points = self.difficulty.params().hit_points;
        self.score = self.score.saturating_add_signed(points);
        self.hits += 1;
        self.accuracy = accuracy(self.hits, self.misses);
        true
    }

    /// Returns false if the miss was ignored. Score floors at zero.
    pub fn register_miss(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        let points = self.difficulty.params().miss_points;
        self.score = self.score.saturating_add_signed(points);
        self.misses += 1;
        self.accuracy = accuracy(self.hits, self.misses);
        true
    }

    /// Advance the game clock. The countdown only runs while active.
    /// Returns true once the countdown has reached zero.
    pub fn advance_clock(&mut self, dt_ms: f32) -> bool {
        if !self.in_progress() {
            return false;
        }
        self.elapsed_ms += f64::from(dt_ms);
        if self.phase == SessionPhase::Paused {
            return false;
        }

        self.second_ms += dt_ms;
        while self.second_ms >= 1000.0 && self.time_left > 0 {
            self.second_ms -= 1000.0;
            self.time_left -= 1;
        }
        self.time_left == 0
    }

    /// Flip between active and paused. Returns false in other phases.
    pub fn toggle_pause(&mut self) -> bool {
        self.phase = match self.phase {
            SessionPhase::Active => SessionPhase::Paused,
            SessionPhase::Paused => SessionPhase::Active,
            _ => return false,
        };
        log::info!("Session {:?}", self.phase);
        true
    }

    /// Finish the session and build its report. `None` if no session was in
    /// progress.
    pub fn end_game(&mut self) -> Option<SessionReport> {
        if !self.in_progress() {
            return None;
        }
        self.phase = SessionPhase::Ended;
        log::info!(
            "Session ended: score {} hits {} misses {} accuracy {}%",
            self.score,
            self.hits,
            self.misses,
            self.accuracy
        );
        Some(self.report())
    }

    /// Abandon the session. Nothing is reported.
    pub fn quit_game(&mut self) -> bool {
        if !self.in_progress() {
            return false;
        }
        self.phase = SessionPhase::Ended;
        log::info!("Session quit with score {}", self.score);
        true
    }

    /// Back to the menu after an ended session
    pub fn return_to_idle(&mut self) {
        if self.phase == SessionPhase::Ended {
            self.phase = SessionPhase::Idle;
        }
    }

    /// Countdown seconds actually played
    pub fn played_secs(&self) -> u32 {
        self.difficulty
            .params()
            .duration_secs
            .saturating_sub(self.time_left)
    }

    /// Snapshot of the session in backend wire form
    pub fn report(&self) -> SessionReport {
        SessionReport {
            score: self.score,
            hits: self.hits,
            misses: self.misses,
            accuracy: self.accuracy,
            difficulty: self.difficulty,
            game_mode: self.game_mode,
            duration_seconds: self.played_secs(),
            start_time: timestamp_from_millis(self.started_at_ms),
            end_time: timestamp_from_millis(self.started_at_ms + self.elapsed_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn started(difficulty: Difficulty) -> Session {
        let mut session = Session::new();
        session.start_game(difficulty, GameMode::TwoD, 1_700_000_000_000.0);
        session
    }

    #[test]
    fn test_start_resets_counters() {
        let mut session = started(Difficulty::Hard);
        session.register_hit();
        session.register_miss();
        session.start_game(Difficulty::Easy, GameMode::ThreeD, 0.0);

        assert_eq!(session.phase, SessionPhase::Active);
        assert_eq!((session.score, session.hits, session.misses), (0, 0, 0));
        assert_eq!(session.accuracy, 0);
        assert_eq!(session.time_left, 60);
        assert_eq!(session.game_mode, GameMode::ThreeD);
    }

    #[test]
    fn test_hit_then_miss_on_easy() {
        let mut session = started(Difficulty::Easy);
        session.register_hit();
        assert_eq!(session.score, 10);
        session.register_miss();
        assert_eq!(session.score, 5);
        assert_eq!((session.hits, session.misses), (1, 1));
        assert_eq!(session.accuracy, 50);
    }

    #[test]
    fn test_miss_never_drops_below_zero() {
        let mut session = started(Difficulty::Hard);
        session.register_hit();
        session.register_miss();
        assert_eq!(session.score, 5);
        session.register_miss();
        assert_eq!(session.score, 0);
        assert_eq!(session.accuracy, 33);
    }

    #[test]
    fn test_paused_session_ignores_shots() {
        let mut session = started(Difficulty::Medium);
        assert!(session.toggle_pause());
        assert!(!session.register_hit());
        assert!(!session.register_miss());
        assert_eq!((session.hits, session.misses, session.score), (0, 0, 0));
    }

    #[test]
    fn test_easy_session_ends_after_sixty_seconds() {
        let mut session = started(Difficulty::Easy);
        assert_eq!(session.time_left, 60);
        for _ in 0..59 {
            assert!(!session.advance_clock(1000.0));
        }
        assert_eq!(session.time_left, 1);
        assert!(session.advance_clock(1000.0));

        let report = session.end_game().expect("session was active");
        assert_eq!(session.phase, SessionPhase::Ended);
        assert_eq!(report.duration_seconds, 60);
    }

    #[test]
    fn test_pause_freezes_countdown() {
        let mut session = started(Difficulty::Hard);
        session.advance_clock(3500.0);
        assert_eq!(session.time_left, 42);

        session.toggle_pause();
        session.advance_clock(10_000.0);
        assert_eq!(session.time_left, 42);

        session.toggle_pause();
        // The half second banked before the pause still counts
        session.advance_clock(500.0);
        assert_eq!(session.time_left, 41);
    }

    #[test]
    fn test_quit_skips_report() {
        let mut session = started(Difficulty::Easy);
        assert!(session.quit_game());
        assert_eq!(session.phase, SessionPhase::Ended);
        assert!(session.end_game().is_none());

        session.return_to_idle();
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(!session.toggle_pause());
    }

    #[test]
    fn test_report_timestamps() {
        let mut session = started(Difficulty::Medium);
        session.advance_clock(2000.0);
        let report = session.report();
        assert_eq!(report.duration_seconds, 2);
        assert_eq!(
            (report.end_time - report.start_time).num_milliseconds(),
            2000
        );
        assert_eq!(report.start_time.timestamp_millis(), 1_700_000_000_000);
    }

    proptest! {
        #[test]
        fn prop_score_and_accuracy_invariants(
            difficulty in prop::sample::select(Difficulty::ALL.to_vec()),
            shots in prop::collection::vec(any::<bool>(), 0..200),
        ) {
            let params = difficulty.params();
            let mut session = started(difficulty);
            let mut expected: i64 = 0;
            for hit in shots {
                if hit {
                    session.register_hit();
                    expected += i64::from(params.hit_points);
                } else {
                    session.register_miss();
                    expected = (expected + i64::from(params.miss_points)).max(0);
                }
                prop_assert_eq!(i64::from(session.score), expected);

                let total = session.hits + session.misses;
                let want = if total == 0 {
                    0
                } else {
                    (f64::from(session.hits) / f64::from(total) * 100.0).round() as u32
                };
                prop_assert_eq!(session.accuracy, want);
            }
        }
    }
}
