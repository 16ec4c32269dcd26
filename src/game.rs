//! Fixed-step game host
//!
//! Turns real frame deltas into simulation ticks and forwards finished
//! sessions to the injected [`Reporter`]. Platform shells (the DOM page, the
//! native demo) own a `Game` and feed it input.

use glam::Vec2;

use crate::backend::{Reporter, SubmitReceipt};
use crate::consts::*;
use crate::sim::{GameEvent, GameState, RenderSurface, TickInput, Viewport, tick};
use crate::tuning::{Difficulty, GameMode};

/// Longest real frame accepted before clamping (seconds)
const MAX_FRAME_DT: f32 = 0.1;

/// Game instance holding simulation state and the reporting client
#[derive(Debug)]
pub struct Game {
    pub state: GameState,
    pub input: TickInput,
    accumulator: f32,
    reporter: Reporter,
    last_receipt: Option<SubmitReceipt>,
}

impl Game {
    pub fn new(seed: u64, reporter: Reporter) -> Self {
        Self {
            state: GameState::new(seed),
            input: TickInput::default(),
            accumulator: 0.0,
            reporter,
            last_receipt: None,
        }
    }

    /// Start a fresh session. `now_ms` is wall-clock time for the report.
    pub fn start(&mut self, difficulty: Difficulty, game_mode: GameMode, now_ms: f64) {
        self.accumulator = 0.0;
        // A pending resize must land before the seed targets are placed
        if let Some(viewport) = self.input.viewport.take() {
            self.state.viewport = viewport;
        }
        self.clear_one_shots();
        self.last_receipt = None;
        self.state.start_game(difficulty, game_mode, now_ms);
    }

    pub fn move_pointer(&mut self, pointer: Vec2) {
        self.input.pointer = Some(pointer);
    }

    pub fn fire(&mut self, point: Vec2) {
        self.input.shots.push(point);
    }

    pub fn toggle_pause(&mut self) {
        self.input.pause = true;
    }

    pub fn quit(&mut self) {
        self.input.quit = true;
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.input.viewport = Some(viewport);
    }

    pub fn return_to_idle(&mut self) {
        self.state.return_to_idle();
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Receipt for the most recent natural end, if the backend accepted it
    pub fn last_receipt(&self) -> Option<&SubmitReceipt> {
        self.last_receipt.as_ref()
    }

    /// Run simulation ticks for `dt` seconds of real time and return what
    /// happened
    pub fn update(&mut self, dt: f32, surface: &dyn RenderSurface) -> Vec<GameEvent> {
        let dt = dt.min(MAX_FRAME_DT);
        self.accumulator += dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= FRAME_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, surface, FRAME_DT);
            self.accumulator -= FRAME_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.clear_one_shots();
            events.extend(self.state.drain_events());
        }

        for event in &events {
            if let GameEvent::Ended { report } = event {
                self.last_receipt = self.reporter.report(report);
            }
        }
        events
    }

    fn clear_one_shots(&mut self) {
        self.input.shots.clear();
        self.input.pause = false;
        self.input.quit = false;
        self.input.viewport = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LeaderboardQuery, MemoryBackend};
    use crate::platform::ProjectedSurface;
    use crate::sim::SessionPhase;

    fn run_seconds(game: &mut Game, secs: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..secs * 60 {
            events.extend(game.update(FRAME_DT, &ProjectedSurface));
        }
        events
    }

    fn member_game() -> Game {
        let mut backend = MemoryBackend::new();
        let credential = backend.register_player("ana");
        Game::new(42, Reporter::new(Box::new(backend), Some(credential)))
    }

    fn board_len(game: &Game) -> usize {
        game.reporter()
            .backend()
            .leaderboard(&LeaderboardQuery::default())
            .unwrap()
            .entries
            .len()
    }

    #[test]
    fn test_accumulator_runs_whole_frames() {
        let mut game = Game::new(1, Reporter::new(Box::new(MemoryBackend::new()), None));
        game.update(FRAME_DT * 2.5, &ProjectedSurface);
        assert_eq!(game.state.time_ticks, 2);
        game.update(FRAME_DT * 0.6, &ProjectedSurface);
        assert_eq!(game.state.time_ticks, 3);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut game = Game::new(1, Reporter::new(Box::new(MemoryBackend::new()), None));
        game.update(5.0, &ProjectedSurface);
        assert!(game.state.time_ticks <= u64::from(MAX_SUBSTEPS));
    }

    #[test]
    fn test_one_shot_inputs_consumed_once() {
        let mut game = Game::new(1, Reporter::new(Box::new(MemoryBackend::new()), None));
        game.start(Difficulty::Easy, GameMode::TwoD, 0.0);
        game.fire(Vec2::new(-500.0, -500.0));
        game.update(FRAME_DT * 3.5, &ProjectedSurface);
        assert_eq!(game.state.session.misses, 1);
        assert!(game.input.shots.is_empty());

        game.toggle_pause();
        game.update(FRAME_DT * 3.5, &ProjectedSurface);
        assert_eq!(game.state.phase(), SessionPhase::Paused);
    }

    #[test]
    fn test_resize_before_start_places_targets_inside() {
        let mut game = Game::new(3, Reporter::new(Box::new(MemoryBackend::new()), None));
        let small = Viewport::new(320.0, 240.0);
        game.resize(small);
        game.start(Difficulty::Easy, GameMode::TwoD, 0.0);
        assert_eq!(game.state.viewport, small);

        for _ in 0..120 {
            game.update(FRAME_DT, &ProjectedSurface);
            assert_eq!(game.state.viewport, small);
            assert!(!game.state.targets().is_empty());
            for target in game.state.targets() {
                let max = small.max_position(target.visible_size());
                assert!(target.pos.x >= 0.0 && target.pos.x <= max.x, "{:?}", target.pos);
                assert!(target.pos.y >= 0.0 && target.pos.y <= max.y, "{:?}", target.pos);
            }
        }
    }

    #[test]
    fn test_natural_end_is_reported() {
        let mut game = member_game();
        game.start(Difficulty::Hard, GameMode::TwoD, 1_700_000_000_000.0);
        let events = run_seconds(&mut game, 46);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Ended { .. })));
        assert!(game.last_receipt().is_some());
        assert_eq!(board_len(&game), 1);

        game.return_to_idle();
        assert_eq!(game.state.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_quit_is_not_reported() {
        let mut game = member_game();
        game.start(Difficulty::Easy, GameMode::TwoD, 0.0);
        run_seconds(&mut game, 2);
        game.quit();
        run_seconds(&mut game, 1);
        assert_eq!(game.state.phase(), SessionPhase::Ended);
        assert!(game.last_receipt().is_none());
        assert_eq!(board_len(&game), 0);
    }

    #[test]
    fn test_anonymous_play_is_not_reported() {
        let mut game = Game::new(9, Reporter::new(Box::new(MemoryBackend::new()), None));
        game.start(Difficulty::Hard, GameMode::ThreeD, 0.0);
        run_seconds(&mut game, 46);
        assert_eq!(game.state.phase(), SessionPhase::Ended);
        assert!(game.last_receipt().is_none());
        assert_eq!(board_len(&game), 0);
    }
}
