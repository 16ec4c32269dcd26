//! In-process score backend
//!
//! Implements the hosted functions' behaviour over plain vectors. Persisted to
//! LocalStorage in the browser build so guest and offline play keep a local
//! leaderboard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::achievements::{Achievement, AwardContext, default_catalog};
use super::*;
use crate::tuning::GameMode;

/// Record of an unlocked achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EarnedAchievement {
    user_id: String,
    achievement_id: String,
    earned_at: DateTime<Utc>,
}

/// Score backend held entirely in memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBackend {
    catalog: Vec<Achievement>,
    profiles: Vec<Profile>,
    /// access token -> user id
    tokens: HashMap<String, String>,
    /// Insertion order = submission order
    sessions: Vec<StoredSession>,
    earned: Vec<EarnedAchievement>,
    next_id: u64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "sharpshot_backend";

    pub fn new() -> Self {
        Self::with_catalog(default_catalog())
    }

    pub fn with_catalog(catalog: Vec<Achievement>) -> Self {
        Self {
            catalog,
            profiles: Vec::new(),
            tokens: HashMap::new(),
            sessions: Vec::new(),
            earned: Vec::new(),
            next_id: 1,
        }
    }

    /// Create a player and hand back their credential
    pub fn register_player(&mut self, display_name: &str) -> Credential {
        let user_id = self.allocate_id("user");
        let access_token = self.allocate_id("token");
        self.profiles.push(Profile::new(user_id.clone(), display_name));
        self.tokens.insert(access_token.clone(), user_id.clone());
        log::info!("Registered player {} ({})", display_name, user_id);
        Credential {
            user_id,
            access_token,
        }
    }

    pub fn profile(&self, user_id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == user_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn allocate_id(&mut self, prefix: &str) -> String {
        let id = self.next_id;
        self.next_id += 1;
        format!("{}-{}", prefix, id)
    }

    /// Resolve a credential to its user id
    fn authenticate(&self, credential: &Credential) -> BackendResult<String> {
        match self.tokens.get(&credential.access_token) {
            Some(user_id) if *user_id == credential.user_id => Ok(user_id.clone()),
            _ => Err(BackendError::Auth),
        }
    }

    fn has_earned(&self, user_id: &str, achievement_id: &str) -> bool {
        self.earned
            .iter()
            .any(|e| e.user_id == user_id && e.achievement_id == achievement_id)
    }

    fn games_played(&self, user_id: &str, mode: GameMode) -> u32 {
        self.sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.report.game_mode == mode)
            .count() as u32
    }

    /// Leaderboard relative to an explicit `now` (timeframe cut-offs)
    pub fn leaderboard_at(&self, query: &LeaderboardQuery, now: DateTime<Utc>) -> Leaderboard {
        let limit = query.effective_limit();
        let cutoff = query.timeframe.cutoff(now);

        let mut rows: Vec<&StoredSession> = self
            .sessions
            .iter()
            .filter(|s| query.difficulty.is_none_or(|d| s.report.difficulty == d))
            .filter(|s| query.game_mode.is_none_or(|m| s.report.game_mode == m))
            .filter(|s| cutoff.is_none_or(|c| s.report.start_time >= c))
            .collect();
        // Stable: equal scores keep submission order
        rows.sort_by(|a, b| b.report.score.cmp(&a.report.score));

        let entries = rows
            .into_iter()
            .take(limit as usize)
            .enumerate()
            .map(|(index, s)| LeaderboardEntry {
                user_id: s.user_id.clone(),
                display_name: self
                    .profile(&s.user_id)
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| "Anonymous".to_string()),
                score: s.report.score,
                accuracy: s.report.accuracy,
                difficulty: s.report.difficulty,
                game_mode: s.report.game_mode,
                created_at: s.report.start_time,
                rank: index as u32 + 1,
            })
            .collect();

        Leaderboard {
            entries,
            filters: LeaderboardFilters {
                difficulty: query
                    .difficulty
                    .map_or_else(|| "all".to_string(), |d| d.to_string()),
                game_mode: query
                    .game_mode
                    .map_or_else(|| "all".to_string(), |m| m.to_string()),
                timeframe: query.timeframe,
                limit,
            },
        }
    }

    /// Load the backend from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<MemoryBackend>(&json) {
                    Ok(backend) => {
                        log::info!("Loaded {} stored sessions", backend.sessions.len());
                        return backend;
                    }
                    Err(err) => log::warn!("Discarding stored scores: {}", err),
                }
            }
        }

        log::info!("No stored scores found, starting fresh");
        Self::new()
    }

    /// Save the backend to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match serde_json::to_string(self) {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Scores saved ({} sessions)", self.sessions.len());
                }
                Err(err) => log::warn!("Failed to serialize scores: {}", err),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

impl ScoreBackend for MemoryBackend {
    fn submit_session(
        &mut self,
        credential: &Credential,
        report: &SessionReport,
    ) -> BackendResult<SubmitReceipt> {
        let user_id = self.authenticate(credential)?;
        if report.accuracy > 100 {
            return Err(BackendError::Validation(format!(
                "accuracy {} out of range",
                report.accuracy
            )));
        }

        let session_id = self.allocate_id("session");
        self.sessions.push(StoredSession {
            id: session_id.clone(),
            user_id: user_id.clone(),
            report: report.clone(),
        });

        let profile = {
            let profile = self
                .profiles
                .iter_mut()
                .find(|p| p.id == user_id)
                .ok_or(BackendError::Auth)?;
            profile.record(report);
            profile.clone()
        };

        let games_in_mode = self.games_played(&user_id, report.game_mode);
        let ctx = AwardContext {
            profile: &profile,
            games_in_mode,
            report,
        };

        let unlocked: Vec<String> = self
            .catalog
            .iter()
            .filter(|a| !self.has_earned(&user_id, &a.id))
            .filter(|a| a.criteria.is_met(&ctx))
            .map(|a| a.id.clone())
            .collect();

        for achievement_id in &unlocked {
            log::info!("{} unlocked {}", user_id, achievement_id);
            self.earned.push(EarnedAchievement {
                user_id: user_id.clone(),
                achievement_id: achievement_id.clone(),
                earned_at: report.end_time,
            });
        }

        Ok(SubmitReceipt {
            session_id,
            new_achievements_count: unlocked.len() as u32,
        })
    }

    fn leaderboard(&self, query: &LeaderboardQuery) -> BackendResult<Leaderboard> {
        Ok(self.leaderboard_at(query, Utc::now()))
    }

    fn user_history(
        &self,
        credential: &Credential,
        page: u32,
        limit: u32,
    ) -> BackendResult<HistoryPage> {
        let user_id = self.authenticate(credential)?;
        let page = page.max(1);
        let limit = page_limit(limit, DEFAULT_HISTORY_LIMIT);

        let mut mine: Vec<&StoredSession> =
            self.sessions.iter().filter(|s| s.user_id == user_id).collect();
        mine.sort_by(|a, b| b.report.start_time.cmp(&a.report.start_time));
        let total = mine.len() as u32;

        let offset = ((page - 1) as usize).saturating_mul(limit as usize);
        let sessions: Vec<StoredSession> = mine
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect();

        let mut stats = HistoryStats {
            total_games: total,
            average_score: 0,
            average_accuracy: 0.0,
            best_game: None,
            recent_games: sessions.iter().take(RECENT_GAMES).cloned().collect(),
        };
        if !sessions.is_empty() {
            let count = sessions.len() as f64;
            let total_score: u64 = sessions.iter().map(|s| u64::from(s.report.score)).sum();
            let total_accuracy: u64 = sessions.iter().map(|s| u64::from(s.report.accuracy)).sum();
            stats.average_score = (total_score as f64 / count).round() as u32;
            stats.average_accuracy = (total_accuracy as f64 / count * 100.0).round() / 100.0;
            // A zero-score game is never "best"
            stats.best_game = sessions
                .iter()
                .fold(None::<&StoredSession>, |best, s| {
                    if s.report.score > best.map_or(0, |b| b.report.score) {
                        Some(s)
                    } else {
                        best
                    }
                })
                .cloned();
        }

        Ok(HistoryPage {
            sessions,
            stats,
            profile: self.profile(&user_id).cloned(),
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages: total.div_ceil(limit),
            },
        })
    }

    fn user_achievements(&self, credential: &Credential) -> BackendResult<AchievementsOverview> {
        let user_id = self.authenticate(credential)?;
        let profile = self.profile(&user_id);

        let achievements: Vec<AchievementStatus> = self
            .catalog
            .iter()
            .map(|achievement| {
                let earned = self
                    .earned
                    .iter()
                    .find(|e| e.user_id == user_id && e.achievement_id == achievement.id);
                let progress = match (earned, profile) {
                    (Some(_), _) => 100,
                    (None, Some(profile)) => {
                        let games_in_mode = achievement
                            .criteria
                            .game_mode
                            .map_or(0, |mode| self.games_played(&user_id, mode));
                        achievement.criteria.progress(profile, games_in_mode)
                    }
                    (None, None) => 0,
                };
                AchievementStatus {
                    achievement: achievement.clone(),
                    is_earned: earned.is_some(),
                    earned_at: earned.map(|e| e.earned_at),
                    progress,
                }
            })
            .collect();

        let mut grouped = GroupedAchievements::default();
        for status in &achievements {
            let bucket = match status.achievement.rarity {
                Rarity::Common => &mut grouped.common,
                Rarity::Rare => &mut grouped.rare,
                Rarity::Epic => &mut grouped.epic,
                Rarity::Legendary => &mut grouped.legendary,
            };
            bucket.push(status.clone());
        }

        let earned = achievements.iter().filter(|a| a.is_earned).count() as u32;
        let total = achievements.len() as u32;
        let points_earned = achievements
            .iter()
            .filter(|a| a.is_earned)
            .map(|a| a.achievement.points)
            .sum();
        let points_available = achievements.iter().map(|a| a.achievement.points).sum();
        let completion_percentage = if total == 0 {
            0
        } else {
            (f64::from(earned) / f64::from(total) * 100.0).round() as u32
        };

        Ok(AchievementsOverview {
            achievements,
            grouped,
            stats: AchievementStats {
                earned,
                total,
                points_earned,
                points_available,
                completion_percentage,
            },
        })
    }

    fn persist(&self) {
        self.save();
    }
}
