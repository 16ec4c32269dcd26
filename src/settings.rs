//! Player preferences
//!
//! Persisted in LocalStorage on the web, defaults natively.

use serde::{Deserialize, Deserializer, Serialize};

use crate::backend::Credential;
use crate::tuning::{Difficulty, GameMode};

/// How the player chose to play on first visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Plays anonymously; nothing is reported
    #[default]
    Guest,
    /// Signed in; finished sessions go to the leaderboard
    Member,
}

impl PlayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerKind::Guest => "guest",
            PlayerKind::Member => "member",
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Last difficulty picked on the start screen
    #[serde(deserialize_with = "lossy_difficulty")]
    pub difficulty: Difficulty,
    #[serde(deserialize_with = "lossy_game_mode")]
    pub game_mode: GameMode,

    pub player: PlayerKind,
    pub display_name: Option<String>,
    /// Credential issued to a member by the score backend
    pub credential: Option<Credential>,
    /// Set once the welcome screen has been answered
    pub visited: bool,

    /// Crosshair colour change near/on targets
    pub crosshair_feedback: bool,
    /// Hit and miss flashes
    pub shot_feedback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            game_mode: GameMode::TwoD,
            player: PlayerKind::Guest,
            display_name: None,
            credential: None,
            visited: false,
            crosshair_feedback: true,
            shot_feedback: true,
        }
    }
}

fn lossy_difficulty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Difficulty, D::Error> {
    let s = String::deserialize(deserializer)?;
    Ok(Difficulty::from_str_lossy(&s))
}

fn lossy_game_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GameMode, D::Error> {
    let s = String::deserialize(deserializer)?;
    Ok(GameMode::from_str_lossy(&s))
}

impl Settings {
    /// Answer the welcome screen
    pub fn choose_player(&mut self, player: PlayerKind, display_name: Option<String>) {
        self.player = player;
        self.display_name = display_name.filter(|name| !name.trim().is_empty());
        if player == PlayerKind::Guest {
            self.credential = None;
        }
        self.visited = true;
    }

    pub fn is_member(&self) -> bool {
        self.player == PlayerKind::Member
    }

    /// Name shown on the leaderboard
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Anonymous")
    }

    /// Credential to report with; guests never report
    pub fn reporting_credential(&self) -> Option<Credential> {
        if self.is_member() {
            self.credential.clone()
        } else {
            None
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "sharpshot_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.difficulty, Difficulty::Medium);
        assert_eq!(settings.game_mode, GameMode::TwoD);
        assert!(!settings.visited);
        assert_eq!(settings.display_name(), "Anonymous");
        assert!(settings.reporting_credential().is_none());
    }

    #[test]
    fn test_malformed_stored_values_fall_back() {
        let json = r#"{"difficulty":"nightmare","game_mode":"4d","visited":true}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.difficulty, Difficulty::Medium);
        assert_eq!(settings.game_mode, GameMode::TwoD);
        assert!(settings.visited);
        assert!(settings.crosshair_feedback);
    }

    #[test]
    fn test_stored_values_round_trip() {
        let mut settings = Settings {
            difficulty: Difficulty::Hard,
            game_mode: GameMode::ThreeD,
            ..Default::default()
        };
        settings.choose_player(PlayerKind::Member, Some("ana".to_string()));
        settings.credential = Some(Credential {
            user_id: "user-1".to_string(),
            access_token: "token-2".to_string(),
        });

        let json = serde_json::to_string(&settings).unwrap();
        let restored: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
        assert_eq!(
            restored.reporting_credential().map(|c| c.user_id),
            Some("user-1".to_string())
        );
    }

    #[test]
    fn test_guest_never_reports() {
        let mut settings = Settings::default();
        settings.credential = Some(Credential {
            user_id: "user-1".to_string(),
            access_token: "token-2".to_string(),
        });
        settings.choose_player(PlayerKind::Guest, Some("  ".to_string()));
        assert!(settings.visited);
        assert!(settings.display_name.is_none());
        assert!(settings.reporting_credential().is_none());
    }
}
