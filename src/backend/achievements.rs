//! Achievement catalog and evaluation

use serde::{Deserialize, Serialize};

use super::{Profile, SessionReport};
use crate::tuning::{Difficulty, GameMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Unlock thresholds. Any satisfied threshold earns the achievement.
/// Zero-valued thresholds are treated as unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AchievementCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_hits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_accuracy: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_total_hits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_games: Option<u32>,
    /// Finish within this many seconds (requires `difficulty`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Restricts `min_games` to games played in this mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<GameMode>,
}

fn threshold(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v > 0)
}

/// Player totals an award decision is made against, after the new session
/// has been recorded
#[derive(Debug, Clone, Copy)]
pub struct AwardContext<'a> {
    pub profile: &'a Profile,
    /// Games played in the submitted session's mode, including it
    pub games_in_mode: u32,
    pub report: &'a SessionReport,
}

impl AchievementCriteria {
    pub fn is_met(&self, ctx: &AwardContext<'_>) -> bool {
        let total_hits = ctx.profile.total_hits;
        let report = ctx.report;

        if threshold(self.min_hits).is_some_and(|min| total_hits >= min) {
            return true;
        }
        if threshold(self.min_total_hits).is_some_and(|min| total_hits >= min) {
            return true;
        }
        if threshold(self.min_accuracy).is_some_and(|min| report.accuracy >= min) {
            return true;
        }
        if threshold(self.min_score).is_some_and(|min| report.score >= min) {
            return true;
        }
        if let Some(min) = threshold(self.min_games) {
            // Scoped to the mode's own games; a lifetime count would let any
            // five 2D games unlock a 3D achievement
            let games = match self.game_mode {
                Some(mode) if mode == report.game_mode => ctx.games_in_mode,
                Some(_) => 0,
                None => ctx.profile.total_games,
            };
            if games >= min {
                return true;
            }
        }
        if let Some(max) = threshold(self.max_duration) {
            if self.difficulty == Some(report.difficulty) && report.duration_seconds <= max {
                return true;
            }
        }
        false
    }

    /// Progress toward the first applicable threshold, 0..=100.
    /// `games_in_mode` is the player's game count in `self.game_mode` and is
    /// only read when that mode is set.
    pub fn progress(&self, profile: &Profile, games_in_mode: u32) -> u32 {
        let ratio = |have: u32, need: u32| (f64::from(have) / f64::from(need) * 100.0).min(100.0);
        let pct = if let Some(min) = threshold(self.min_hits).or(threshold(self.min_total_hits)) {
            ratio(profile.total_hits, min)
        } else if let Some(min) = threshold(self.min_games) {
            let games = match self.game_mode {
                Some(_) => games_in_mode,
                None => profile.total_games,
            };
            ratio(games, min)
        } else if let Some(min) = threshold(self.min_score) {
            ratio(profile.highest_score, min)
        } else if let Some(min) = threshold(self.min_accuracy) {
            ratio(profile.best_accuracy, min)
        } else {
            0.0
        };
        pct.round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon_name: String,
    pub points: u32,
    pub rarity: Rarity,
    pub criteria: AchievementCriteria,
}

impl Achievement {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        icon_name: &str,
        points: u32,
        rarity: Rarity,
        criteria: AchievementCriteria,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon_name: icon_name.to_string(),
            points,
            rarity,
            criteria,
        }
    }
}

/// Built-in achievement catalog, ordered by rarity then points (descending)
pub fn default_catalog() -> Vec<Achievement> {
    let mut catalog = vec![
        Achievement::new(
            "first-hit",
            "First Blood",
            "Hit your first target",
            "target",
            10,
            Rarity::Common,
            AchievementCriteria {
                min_hits: Some(1),
                ..Default::default()
            },
        ),
        Achievement::new(
            "regular",
            "Regular",
            "Play 10 games",
            "calendar",
            20,
            Rarity::Common,
            AchievementCriteria {
                min_games: Some(10),
                ..Default::default()
            },
        ),
        Achievement::new(
            "sharpshooter",
            "Sharpshooter",
            "Finish a game with 90% accuracy",
            "crosshair",
            50,
            Rarity::Rare,
            AchievementCriteria {
                min_accuracy: Some(90),
                ..Default::default()
            },
        ),
        Achievement::new(
            "centurion",
            "Centurion",
            "Hit 100 targets in total",
            "award",
            40,
            Rarity::Rare,
            AchievementCriteria {
                min_total_hits: Some(100),
                ..Default::default()
            },
        ),
        Achievement::new(
            "deep-diver",
            "Deep Diver",
            "Play 5 games in 3D mode",
            "box",
            40,
            Rarity::Rare,
            AchievementCriteria {
                min_games: Some(5),
                game_mode: Some(GameMode::ThreeD),
                ..Default::default()
            },
        ),
        Achievement::new(
            "high-roller",
            "High Roller",
            "Score 500 points in one game",
            "trophy",
            75,
            Rarity::Epic,
            AchievementCriteria {
                min_score: Some(500),
                ..Default::default()
            },
        ),
        Achievement::new(
            "hard-survivor",
            "Hard Survivor",
            "Finish a full game on hard",
            "shield",
            60,
            Rarity::Epic,
            AchievementCriteria {
                max_duration: Some(45),
                difficulty: Some(Difficulty::Hard),
                ..Default::default()
            },
        ),
        Achievement::new(
            "legend",
            "Legend",
            "Hit 1000 targets in total",
            "crown",
            150,
            Rarity::Legendary,
            AchievementCriteria {
                min_total_hits: Some(1000),
                ..Default::default()
            },
        ),
    ];
    catalog.sort_by(|a, b| a.rarity.cmp(&b.rarity).then(b.points.cmp(&a.points)));
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::timestamp_from_millis;

    fn report(score: u32, hits: u32, misses: u32, accuracy: u32) -> SessionReport {
        SessionReport {
            score,
            hits,
            misses,
            accuracy,
            difficulty: Difficulty::Hard,
            game_mode: GameMode::TwoD,
            duration_seconds: 45,
            start_time: timestamp_from_millis(0.0),
            end_time: timestamp_from_millis(45_000.0),
        }
    }

    fn profile_after(report: &SessionReport) -> Profile {
        let mut profile = Profile::new("u", "Player");
        profile.record(report);
        profile
    }

    #[test]
    fn test_any_threshold_earns() {
        let report = report(50, 5, 20, 20);
        let profile = profile_after(&report);
        let ctx = AwardContext {
            profile: &profile,
            games_in_mode: 1,
            report: &report,
        };

        let criteria = AchievementCriteria {
            min_score: Some(1000),
            min_hits: Some(5),
            ..Default::default()
        };
        assert!(criteria.is_met(&ctx));

        let criteria = AchievementCriteria {
            min_accuracy: Some(90),
            ..Default::default()
        };
        assert!(!criteria.is_met(&ctx));
    }

    #[test]
    fn test_zero_threshold_is_unset() {
        let report = report(0, 0, 3, 0);
        let profile = profile_after(&report);
        let ctx = AwardContext {
            profile: &profile,
            games_in_mode: 1,
            report: &report,
        };
        let criteria = AchievementCriteria {
            min_score: Some(0),
            ..Default::default()
        };
        assert!(!criteria.is_met(&ctx));
    }

    #[test]
    fn test_mode_scoped_games() {
        let report = report(10, 1, 0, 100);
        let mut profile = profile_after(&report);
        profile.total_games = 9;
        let criteria = AchievementCriteria {
            min_games: Some(5),
            game_mode: Some(GameMode::ThreeD),
            ..Default::default()
        };
        // Plenty of games overall, none of them in 3D
        let ctx = AwardContext {
            profile: &profile,
            games_in_mode: 9,
            report: &report,
        };
        assert!(!criteria.is_met(&ctx));
    }

    #[test]
    fn test_duration_needs_matching_difficulty() {
        let mut report = report(10, 1, 0, 100);
        let profile = profile_after(&report);
        let criteria = AchievementCriteria {
            max_duration: Some(45),
            difficulty: Some(Difficulty::Hard),
            ..Default::default()
        };
        let ctx = AwardContext {
            profile: &profile,
            games_in_mode: 1,
            report: &report,
        };
        assert!(criteria.is_met(&ctx));

        report.difficulty = Difficulty::Easy;
        let ctx = AwardContext {
            profile: &profile,
            games_in_mode: 1,
            report: &report,
        };
        assert!(!criteria.is_met(&ctx));
    }

    #[test]
    fn test_progress() {
        let mut profile = Profile::new("u", "Player");
        profile.total_hits = 25;
        profile.total_games = 3;
        profile.highest_score = 900;

        let hits = AchievementCriteria {
            min_total_hits: Some(100),
            ..Default::default()
        };
        assert_eq!(hits.progress(&profile, 0), 25);

        let games = AchievementCriteria {
            min_games: Some(7),
            ..Default::default()
        };
        assert_eq!(games.progress(&profile, 0), 43);

        let score = AchievementCriteria {
            min_score: Some(500),
            ..Default::default()
        };
        assert_eq!(score.progress(&profile, 0), 100);

        assert_eq!(AchievementCriteria::default().progress(&profile, 0), 0);
    }

    #[test]
    fn test_progress_counts_mode_games() {
        let mut profile = Profile::new("u", "Player");
        profile.total_games = 6;

        let deep = AchievementCriteria {
            min_games: Some(5),
            game_mode: Some(GameMode::ThreeD),
            ..Default::default()
        };
        assert_eq!(deep.progress(&profile, 0), 0);
        assert_eq!(deep.progress(&profile, 2), 40);
        assert_eq!(deep.progress(&profile, 9), 100);
    }

    #[test]
    fn test_catalog_order() {
        let catalog = default_catalog();
        assert!(catalog.windows(2).all(|w| {
            w[0].rarity < w[1].rarity || (w[0].rarity == w[1].rarity && w[0].points >= w[1].points)
        }));
    }
}
