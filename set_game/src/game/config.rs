//! Game configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of slots on the table (default: 12)
    pub table_size: usize,

    /// Number of distinct cards (default: 81)
    pub deck_size: usize,

    /// Number of tokens that make up a claim (default: 3)
    pub claim_size: usize,

    /// Round clock, reset on every scored claim
    pub round_duration_ms: u64,

    /// Remaining round time below which the countdown is shown as urgent
    pub urgent_threshold_ms: u64,

    /// Freeze after a scored claim
    pub point_freeze_ms: u64,

    /// Freeze after a rejected claim
    pub penalty_freeze_ms: u64,

    /// Players fed by an external input source, ids `0..human_players`
    pub human_players: usize,

    /// Players fed by a synthetic input generator, ids after the humans
    pub computer_players: usize,

    /// Pause between synthetic key presses
    pub computer_pause_ms: u64,

    /// Log every valid combination on the table at round start
    pub hints: bool,

    /// Pause after announcing winners before the arbiter returns
    pub end_game_pause_ms: u64,

    /// Seed for dealing and synthetic input; random when unset
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            table_size: 12,
            deck_size: 81,
            claim_size: 3,
            round_duration_ms: 60_000,
            urgent_threshold_ms: 5_000,
            point_freeze_ms: 1_000,
            penalty_freeze_ms: 3_000,
            human_players: 0,
            computer_players: 2,
            computer_pause_ms: 50,
            hints: false,
            end_game_pause_ms: 0,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Load configuration from `SET_*` environment variables, falling back to
    /// the defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            table_size: parse_env_or("SET_TABLE_SIZE", defaults.table_size),
            deck_size: parse_env_or("SET_DECK_SIZE", defaults.deck_size),
            claim_size: parse_env_or("SET_CLAIM_SIZE", defaults.claim_size),
            round_duration_ms: parse_env_or("SET_ROUND_DURATION_MS", defaults.round_duration_ms),
            urgent_threshold_ms: parse_env_or(
                "SET_URGENT_THRESHOLD_MS",
                defaults.urgent_threshold_ms,
            ),
            point_freeze_ms: parse_env_or("SET_POINT_FREEZE_MS", defaults.point_freeze_ms),
            penalty_freeze_ms: parse_env_or("SET_PENALTY_FREEZE_MS", defaults.penalty_freeze_ms),
            human_players: parse_env_or("SET_HUMAN_PLAYERS", defaults.human_players),
            computer_players: parse_env_or("SET_COMPUTER_PLAYERS", defaults.computer_players),
            computer_pause_ms: parse_env_or("SET_COMPUTER_PAUSE_MS", defaults.computer_pause_ms),
            hints: parse_env_or("SET_HINTS", defaults.hints),
            end_game_pause_ms: parse_env_or("SET_END_GAME_PAUSE_MS", defaults.end_game_pause_ms),
            seed: std::env::var("SET_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_size == 0 {
            return Err(ConfigError::invalid("table_size", "Must be greater than 0"));
        }

        if self.claim_size == 0 {
            return Err(ConfigError::invalid("claim_size", "Must be greater than 0"));
        }

        if self.claim_size > self.table_size {
            return Err(ConfigError::invalid(
                "claim_size",
                format!("Must not exceed table size ({})", self.table_size),
            ));
        }

        if self.deck_size < self.table_size {
            return Err(ConfigError::invalid(
                "deck_size",
                format!("Must be at least the table size ({})", self.table_size),
            ));
        }

        if self.deck_size > u32::MAX as usize {
            return Err(ConfigError::invalid("deck_size", "Must fit card identifiers"));
        }

        if self.player_count() == 0 {
            return Err(ConfigError::invalid(
                "human_players",
                "At least one human or computer player is required",
            ));
        }

        if self.round_duration_ms == 0 {
            return Err(ConfigError::invalid(
                "round_duration_ms",
                "Must be greater than 0",
            ));
        }

        if self.urgent_threshold_ms > self.round_duration_ms {
            return Err(ConfigError::invalid(
                "urgent_threshold_ms",
                format!(
                    "Must not exceed round duration ({} ms)",
                    self.round_duration_ms
                ),
            ));
        }

        Ok(())
    }

    pub fn player_count(&self) -> usize {
        self.human_players + self.computer_players
    }

    pub fn round_duration(&self) -> Duration {
        Duration::from_millis(self.round_duration_ms)
    }

    pub fn urgent_threshold(&self) -> Duration {
        Duration::from_millis(self.urgent_threshold_ms)
    }

    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_ms)
    }

    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_ms)
    }

    pub fn computer_pause(&self) -> Duration {
        Duration::from_millis(self.computer_pause_ms)
    }

    pub fn end_game_pause(&self) -> Duration {
        Duration::from_millis(self.end_game_pause_ms)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Malformed configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
