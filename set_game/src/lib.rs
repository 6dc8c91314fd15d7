//! # Set Game
//!
//! Real-time concurrency core of a multiplayer Set-style card game.
//!
//! An arbiter deals cards onto a shared table and runs a countdown per
//! round. Players race to place tokens on cards; a player holding a full
//! claim's worth of tokens submits it and blocks until the arbiter rules on
//! it. Valid claims score and freeze the player briefly, invalid ones freeze
//! it longer, and claims made stale by someone else's point are released
//! without effect.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, table, deck, combination rules and configuration
//! - [`arbiter`]: Round loop and claim examination
//! - [`player`]: Player actors and computer input
//! - [`events`]: Presentation events
//!
//! ## Example
//!
//! ```no_run
//! use set_game::{ArbiterActor, EventSink, FeatureRules, GameConfig};
//! use std::sync::Arc;
//!
//! # async fn demo() -> set_game::GameResult<()> {
//! let (arbiter, handle) = ArbiterActor::new(
//!     GameConfig::default(),
//!     Arc::new(FeatureRules::default()),
//!     EventSink::new(),
//! )?;
//! let game = tokio::spawn(arbiter.run());
//! handle.terminate();
//! # let _ = game.await;
//! # Ok(())
//! # }
//! ```

pub mod arbiter;
pub mod errors;
pub mod events;
pub mod game;
pub mod player;

pub use arbiter::{ArbiterActor, ArbiterHandle, GameSummary};
pub use errors::{GameError, GameResult};
pub use events::{EventSink, GameEvent};
pub use game::{
    Card, CombinationRules, FeatureRules, GameConfig, Pick, PlayerId, Slot, Verdict,
};
pub use player::{PlayerHandle, PlayerKind, PlayerState};
