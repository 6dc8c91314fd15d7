//! Passive game data: cards, table, deck, rules and configuration.
//!
//! Nothing in here spawns tasks or waits. The arbiter owns the table and
//! deck for mutation; players only read the table.

pub mod config;
pub mod deck;
pub mod entities;
pub mod rules;
pub mod table;

pub use config::{ConfigError, GameConfig};
pub use deck::Deck;
pub use entities::{Card, FreezeKind, Pick, PlayerId, Slot, Verdict};
pub use rules::{CombinationRules, FeatureRules};
pub use table::{SharedTable, Table};
