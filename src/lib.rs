//! Sharpshot - a timed target-shooting mini-game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, motion, hit-testing, scoring)
//! - `game`: Fixed-step host driver and session reporting
//! - `backend`: Score persistence contract and in-memory reference backend
//! - `platform`: Render surfaces (headless projection, browser DOM)
//! - `tuning`: Data-driven game balance

pub mod backend;
pub mod game;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::Game;
pub use settings::{PlayerKind, Settings};
pub use tuning::{Difficulty, DifficultyParams, GameMode};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one animation frame at 60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Geometry cache refresh throttle (ms)
    pub const CACHE_REFRESH_MS: f64 = 16.0;
    /// Crosshair "near target" distance (pixels)
    pub const NEAR_TARGET_RADIUS: f32 = 80.0;

    /// Depth bounds for 3D targets
    pub const Z_MIN: f32 = 100.0;
    pub const Z_MAX: f32 = 800.0;
    /// Perspective distance used for shrink/opacity and the CSS projection
    pub const PERSPECTIVE: f32 = 1000.0;
    /// 3D targets spawn larger to compensate for perspective shrink
    pub const SIZE_SCALE_3D: f32 = 1.1;

    /// Targets seeded immediately when a session activates
    pub const INITIAL_TARGETS: usize = 2;

    /// Default viewport when the host has not reported one
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 720.0;
}
