//! Game error types.

use crate::game::config::ConfigError;
use thiserror::Error;

/// Game errors
///
/// Stale or invalidated claims are ordinary outcomes and never show up here.
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Rule engine and configuration disagree on the claim size
    #[error("Rule engine groups {rules} cards but configuration claims {configured}")]
    RulesMismatch { rules: usize, configured: usize },

    /// Claim intake closed (the arbiter has shut down)
    #[error("Arbiter is no longer accepting claims")]
    ArbiterClosed,

    /// A joined actor task panicked
    #[error("{actor} panicked before shutdown")]
    ActorPanicked { actor: String },
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
