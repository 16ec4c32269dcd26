//! Score persistence contract
//!
//! Request/response types for the four backend operations, the
//! [`ScoreBackend`] trait the game talks to, and [`Reporter`], the injected
//! collaborator that submits finished sessions on a best-effort basis.
//!
//! The hosted backend is external; [`MemoryBackend`] implements the same
//! semantics in process for local play, headless runs and tests.

pub mod achievements;
pub mod memory;

pub use achievements::{Achievement, AchievementCriteria, Rarity};
pub use memory::MemoryBackend;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tuning::{Difficulty, GameMode};

/// Largest page/leaderboard size the backend will return
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
/// Sessions echoed in `HistoryStats::recent_games`
pub const RECENT_GAMES: usize = 5;

/// Backend failures
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing or unknown bearer credential
    #[error("Invalid authorization")]
    Auth,
    /// Request body rejected
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Transport or server failure
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Requested page size, with 0 meaning `default`
pub(crate) fn page_limit(requested: u32, default: u32) -> u32 {
    match requested {
        0 => default,
        n => n.min(MAX_PAGE_LIMIT),
    }
}

/// Convert host milliseconds since the Unix epoch to a UTC timestamp
pub fn timestamp_from_millis(ms: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms.round() as i64).unwrap_or_default()
}

/// Bearer credential for an authenticated player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub user_id: String,
    pub access_token: String,
}

/// A finished session, as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub score: u32,
    pub hits: u32,
    pub misses: u32,
    pub accuracy: u32,
    pub difficulty: Difficulty,
    pub game_mode: GameMode,
    pub duration_seconds: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub session_id: String,
    #[serde(rename = "new_achievements", default)]
    pub new_achievements_count: u32,
}

/// Leaderboard time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl Timeframe {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(Timeframe::All),
            "today" => Some(Timeframe::Today),
            "week" => Some(Timeframe::Week),
            "month" => Some(Timeframe::Month),
            _ => None,
        }
    }

    /// Parse a query parameter, falling back to all time
    pub fn from_str_lossy(s: &str) -> Self {
        Self::from_str(s).unwrap_or_else(|| {
            log::warn!("Unknown timeframe {:?}, using all", s);
            Timeframe::All
        })
    }

    /// Earliest start time included, relative to `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Timeframe::All => None,
            Timeframe::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            Timeframe::Week => Some(now - chrono::Duration::days(7)),
            Timeframe::Month => now.checked_sub_months(chrono::Months::new(1)),
        }
    }
}

/// Leaderboard filters; `None` means "all"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub difficulty: Option<Difficulty>,
    pub game_mode: Option<GameMode>,
    #[serde(default)]
    pub timeframe: Timeframe,
    pub limit: u32,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            difficulty: None,
            game_mode: None,
            timeframe: Timeframe::All,
            limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

impl LeaderboardQuery {
    /// Limit capped at MAX_PAGE_LIMIT; 0 means the default
    pub fn effective_limit(&self) -> u32 {
        page_limit(self.limit, DEFAULT_LEADERBOARD_LIMIT)
    }
}

/// One ranked leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub score: u32,
    pub accuracy: u32,
    pub difficulty: Difficulty,
    pub game_mode: GameMode,
    pub created_at: DateTime<Utc>,
    /// 1-based, by descending score
    pub rank: u32,
}

/// Filters echoed back with the leaderboard ("all" when unset)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardFilters {
    pub difficulty: String,
    pub game_mode: String,
    pub timeframe: Timeframe,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    #[serde(rename = "leaderboard")]
    pub entries: Vec<LeaderboardEntry>,
    pub filters: LeaderboardFilters,
}

/// A stored session as returned in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub report: SessionReport,
}

/// Lifetime stats kept per player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub total_games: u32,
    pub highest_score: u32,
    pub total_hits: u32,
    pub total_misses: u32,
    pub best_accuracy: u32,
}

impl Profile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            total_games: 0,
            highest_score: 0,
            total_hits: 0,
            total_misses: 0,
            best_accuracy: 0,
        }
    }

    /// Fold a finished session into the lifetime stats
    pub fn record(&mut self, report: &SessionReport) {
        self.total_games += 1;
        self.highest_score = self.highest_score.max(report.score);
        self.total_hits += report.hits;
        self.total_misses += report.misses;
        self.best_accuracy = self.best_accuracy.max(report.accuracy);
    }
}

/// Aggregates over the returned history page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// All sessions of the player, not just this page
    pub total_games: u32,
    pub average_score: u32,
    /// Two decimal places
    pub average_accuracy: f64,
    pub best_game: Option<StoredSession>,
    pub recent_games: Vec<StoredSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub sessions: Vec<StoredSession>,
    pub stats: HistoryStats,
    pub profile: Option<Profile>,
    pub pagination: Pagination,
}

/// Catalog entry plus the player's standing on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub is_earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
    /// 0..=100
    pub progress: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupedAchievements {
    pub common: Vec<AchievementStatus>,
    pub rare: Vec<AchievementStatus>,
    pub epic: Vec<AchievementStatus>,
    pub legendary: Vec<AchievementStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStats {
    pub earned: u32,
    pub total: u32,
    pub points_earned: u32,
    pub points_available: u32,
    pub completion_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementsOverview {
    pub achievements: Vec<AchievementStatus>,
    #[serde(rename = "grouped_achievements")]
    pub grouped: GroupedAchievements,
    pub stats: AchievementStats,
}

/// Score persistence operations
pub trait ScoreBackend {
    /// Store a finished session for the credential's player
    fn submit_session(
        &mut self,
        credential: &Credential,
        report: &SessionReport,
    ) -> BackendResult<SubmitReceipt>;

    /// Public, ranked high scores
    fn leaderboard(&self, query: &LeaderboardQuery) -> BackendResult<Leaderboard>;

    /// Paged session history, newest first. `page` is 1-based.
    fn user_history(
        &self,
        credential: &Credential,
        page: u32,
        limit: u32,
    ) -> BackendResult<HistoryPage>;

    fn user_achievements(&self, credential: &Credential) -> BackendResult<AchievementsOverview>;

    /// Flush local state to durable storage after a write. Remote backends
    /// have nothing to do.
    fn persist(&self) {}

    /// Submit a raw JSON request body, rejecting it if `score` is absent
    fn submit_session_json(
        &mut self,
        credential: &Credential,
        body: &str,
    ) -> BackendResult<SubmitReceipt> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        if value.get("score").is_none_or(serde_json::Value::is_null) {
            return Err(BackendError::Validation("Score is required".to_string()));
        }
        let report: SessionReport = serde_json::from_value(value)?;
        self.submit_session(credential, &report)
    }
}

/// Best-effort session reporting
///
/// Holds the injected backend and, for signed-in players, their credential.
/// Anonymous reporters never call the backend. Failures are logged and
/// swallowed so they never hold up the game.
pub struct Reporter {
    backend: Box<dyn ScoreBackend>,
    credential: Option<Credential>,
}

impl Reporter {
    pub fn new(backend: Box<dyn ScoreBackend>, credential: Option<Credential>) -> Self {
        Self {
            backend,
            credential,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn backend(&self) -> &dyn ScoreBackend {
        self.backend.as_ref()
    }

    /// Submit a finished session. Returns the receipt when the backend
    /// accepted it; never fails.
    pub fn report(&mut self, report: &SessionReport) -> Option<SubmitReceipt> {
        let Some(credential) = self.credential.as_ref() else {
            log::debug!("Anonymous session, skipping report");
            return None;
        };
        match self.backend.submit_session(credential, report) {
            Ok(receipt) => {
                self.backend.persist();
                log::info!(
                    "Session {} saved ({} new achievements)",
                    receipt.session_id,
                    receipt.new_achievements_count
                );
                Some(receipt)
            }
            Err(err) => {
                log::warn!("Failed to submit session: {}", err);
                None
            }
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend that rejects everything
    struct DownBackend;

    impl ScoreBackend for DownBackend {
        fn submit_session(&mut self, _: &Credential, _: &SessionReport) -> BackendResult<SubmitReceipt> {
            Err(BackendError::Unavailable("connection refused".to_string()))
        }

        fn leaderboard(&self, _: &LeaderboardQuery) -> BackendResult<Leaderboard> {
            Err(BackendError::Unavailable("connection refused".to_string()))
        }

        fn user_history(&self, _: &Credential, _: u32, _: u32) -> BackendResult<HistoryPage> {
            Err(BackendError::Auth)
        }

        fn user_achievements(&self, _: &Credential) -> BackendResult<AchievementsOverview> {
            Err(BackendError::Auth)
        }
    }

    fn report() -> SessionReport {
        SessionReport {
            score: 120,
            hits: 12,
            misses: 0,
            accuracy: 100,
            difficulty: Difficulty::Easy,
            game_mode: GameMode::TwoD,
            duration_seconds: 60,
            start_time: timestamp_from_millis(1_700_000_000_000.0),
            end_time: timestamp_from_millis(1_700_000_060_000.0),
        }
    }

    fn credential() -> Credential {
        Credential {
            user_id: "u1".to_string(),
            access_token: "tok".to_string(),
        }
    }

    #[test]
    fn test_report_failure_is_swallowed() {
        let mut reporter = Reporter::new(Box::new(DownBackend), Some(credential()));
        assert!(reporter.report(&report()).is_none());
    }

    #[test]
    fn test_anonymous_reporter_skips_backend() {
        let mut reporter = Reporter::new(Box::new(MemoryBackend::new()), None);
        assert!(reporter.report(&report()).is_none());
        let board = reporter.backend().leaderboard(&LeaderboardQuery::default()).unwrap();
        assert!(board.entries.is_empty());
    }

    #[test]
    fn test_report_wire_format() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["difficulty"], "easy");
        assert_eq!(json["game_mode"], "2d");
        assert_eq!(json["duration_seconds"], 60);
        assert!(json["start_time"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn test_receipt_reads_new_achievements() {
        let receipt: SubmitReceipt =
            serde_json::from_str(r#"{"success":true,"session_id":"s1","new_achievements":2}"#).unwrap();
        assert_eq!(receipt.new_achievements_count, 2);
        let receipt: SubmitReceipt = serde_json::from_str(r#"{"session_id":"s2"}"#).unwrap();
        assert_eq!(receipt.new_achievements_count, 0);
    }

    #[test]
    fn test_timeframe_cutoffs() {
        let now = timestamp_from_millis(1_700_000_000_000.0); // 2023-11-14T22:13:20Z
        assert_eq!(Timeframe::All.cutoff(now), None);
        assert_eq!(
            Timeframe::Today.cutoff(now).unwrap().to_rfc3339(),
            "2023-11-14T00:00:00+00:00"
        );
        assert_eq!(
            Timeframe::Week.cutoff(now).unwrap().to_rfc3339(),
            "2023-11-07T22:13:20+00:00"
        );
        assert_eq!(
            Timeframe::Month.cutoff(now).unwrap().to_rfc3339(),
            "2023-10-14T22:13:20+00:00"
        );
    }

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!(Timeframe::from_str(" Week "), Some(Timeframe::Week));
        assert_eq!(Timeframe::from_str("fortnight"), None);
        assert_eq!(Timeframe::from_str_lossy("today"), Timeframe::Today);
        assert_eq!(Timeframe::from_str_lossy("fortnight"), Timeframe::All);
    }

    #[test]
    fn test_limit_is_clamped() {
        let query = LeaderboardQuery {
            limit: 500,
            ..Default::default()
        };
        assert_eq!(query.effective_limit(), 100);
        let query = LeaderboardQuery {
            limit: 0,
            ..Default::default()
        };
        assert_eq!(query.effective_limit(), 10);
    }
}
