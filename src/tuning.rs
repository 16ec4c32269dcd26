//! Data-driven game balance
//!
//! Every difficulty-dependent number lives in [`DifficultyParams`]. Nothing
//! else in the crate should branch on [`Difficulty`] directly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Difficulty level, fixed for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Parse a difficulty, falling back to medium for anything unrecognised
    pub fn from_str_lossy(s: &str) -> Self {
        Self::from_str(s).unwrap_or_else(|| {
            log::warn!("Unknown difficulty {:?}, using medium", s);
            Difficulty::Medium
        })
    }

    /// Parameter bundle for this difficulty
    pub fn params(&self) -> DifficultyParams {
        match self {
            Difficulty::Easy => DifficultyParams {
                duration_secs: 60,
                hit_points: 10,
                miss_points: -5,
                max_targets: 3,
                size_range: (30, 50),
                speed_range: (0.6, 1.2),
                spawn_interval_ms: 2000.0,
            },
            Difficulty::Medium => DifficultyParams {
                duration_secs: 60,
                hit_points: 10,
                miss_points: -5,
                max_targets: 4,
                size_range: (25, 40),
                speed_range: (0.8, 1.5),
                spawn_interval_ms: 1500.0,
            },
            Difficulty::Hard => DifficultyParams {
                duration_secs: 45,
                hit_points: 15,
                miss_points: -10,
                max_targets: 5,
                size_range: (20, 35),
                speed_range: (1.2, 2.0),
                spawn_interval_ms: 1000.0,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Planar or depth-simulated target movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameMode {
    #[default]
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::TwoD => "2d",
            GameMode::ThreeD => "3d",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "2d" => Some(GameMode::TwoD),
            "3d" => Some(GameMode::ThreeD),
            _ => None,
        }
    }

    /// Parse a game mode, falling back to 2D
    pub fn from_str_lossy(s: &str) -> Self {
        Self::from_str(s).unwrap_or_else(|| {
            log::warn!("Unknown game mode {:?}, using 2d", s);
            GameMode::TwoD
        })
    }

    pub fn is_3d(&self) -> bool {
        matches!(self, GameMode::ThreeD)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spawn and scoring parameters for one difficulty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyParams {
    /// Session length in seconds
    pub duration_secs: u32,
    /// Points added per hit
    pub hit_points: i32,
    /// Points added per miss (negative)
    pub miss_points: i32,
    /// Maximum concurrent live targets
    pub max_targets: usize,
    /// Inclusive base diameter range (pixels)
    pub size_range: (u32, u32),
    /// Speed range (pixels per frame)
    pub speed_range: (f32, f32),
    /// Milliseconds between spawn attempts
    pub spawn_interval_ms: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_table() {
        let easy = Difficulty::Easy.params();
        assert_eq!(easy.duration_secs, 60);
        assert_eq!(easy.max_targets, 3);
        assert_eq!(easy.size_range, (30, 50));

        let hard = Difficulty::Hard.params();
        assert_eq!(hard.duration_secs, 45);
        assert_eq!(hard.hit_points, 15);
        assert_eq!(hard.miss_points, -10);
        assert_eq!(hard.spawn_interval_ms, 1000.0);
    }

    #[test]
    fn test_malformed_difficulty_falls_back_to_medium() {
        assert_eq!(Difficulty::from_str_lossy("HARD"), Difficulty::Hard);
        assert_eq!(Difficulty::from_str_lossy("nightmare"), Difficulty::Medium);
        assert_eq!(Difficulty::from_str_lossy(""), Difficulty::Medium);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Difficulty::Easy).unwrap(), "\"easy\"");
        assert_eq!(serde_json::to_string(&GameMode::ThreeD).unwrap(), "\"3d\"");
        let mode: GameMode = serde_json::from_str("\"2d\"").unwrap();
        assert_eq!(mode, GameMode::TwoD);
    }
}
