use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a table position.
pub type Slot = usize;

/// A card is an opaque identifier drawn from `[0, deck_size)`.
///
/// What the identifier means (its features) is up to the rule engine.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub u32);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02}", self.0)
    }
}

/// Player identifier, starting from 0.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(pub usize);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// A slot together with the card it held, and the table round, when a
/// player looked at it.
///
/// Key presses and claims carry picks rather than bare slots so that a
/// press or claim made against a card that has since left the table can
/// be told apart from one made against whatever card replaced it. The
/// round tells a card apart from itself re-dealt into the same slot after
/// a sweep.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Pick {
    pub slot: Slot,
    pub card: Card,
    pub round: u32,
}

impl Pick {
    /// Pick made during the first table round
    pub fn new(slot: Slot, card: Card) -> Self {
        Self {
            slot,
            card,
            round: 0,
        }
    }

    pub fn in_round(self, round: u32) -> Self {
        Self { round, ..self }
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.card, self.slot)
    }
}

/// Outcome of examining a claim.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Verdict {
    /// The claim formed a valid combination and scored.
    Point,
    /// The claim was examined and did not form a valid combination.
    Penalty,
    /// The claim was never scored: it went stale or was invalidated.
    Neutral,
}

impl Verdict {
    /// Freeze the claim owner enters after receiving this verdict.
    pub fn freeze_kind(&self) -> Option<FreezeKind> {
        match self {
            Verdict::Point => Some(FreezeKind::Point),
            Verdict::Penalty => Some(FreezeKind::Penalty),
            Verdict::Neutral => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Verdict::Point => "point",
            Verdict::Penalty => "penalty",
            Verdict::Neutral => "neutral",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum FreezeKind {
    Point,
    Penalty,
}
