//! Player state machine states and token bookkeeping.

use crate::game::{
    entities::{FreezeKind, Pick},
    table::Table,
};
use std::fmt;

/// Where a player actor currently is
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlayerState {
    /// Created, not yet running
    Idle,
    /// Suspended on the input buffer
    AwaitingInput,
    /// Claim submitted, suspended on its verdict
    AwaitingVerdict,
    /// Ignoring input until the freeze runs out
    Frozen(FreezeKind),
    Terminated,
}

impl PlayerState {
    /// Whether new key presses are refused in this state
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            PlayerState::AwaitingVerdict | PlayerState::Frozen(_) | PlayerState::Terminated
        )
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerState::Idle => write!(f, "idle"),
            PlayerState::AwaitingInput => write!(f, "awaiting input"),
            PlayerState::AwaitingVerdict => write!(f, "awaiting verdict"),
            PlayerState::Frozen(FreezeKind::Point) => write!(f, "frozen (point)"),
            PlayerState::Frozen(FreezeKind::Penalty) => write!(f, "frozen (penalty)"),
            PlayerState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Effect of pressing a slot on a player's tokens
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenUpdate {
    Placed,
    /// Placed the last token a claim needs
    Completed,
    Removed,
    /// All tokens already placed and the slot is not one of them
    Ignored,
}

/// A player's tokens in placement order
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TokenSet {
    capacity: usize,
    picks: Vec<Pick>,
}

impl TokenSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            picks: Vec::with_capacity(capacity),
        }
    }

    /// Toggle a token on the picked slot
    pub fn toggle(&mut self, pick: Pick) -> TokenUpdate {
        if let Some(pos) = self.picks.iter().position(|t| t.slot == pick.slot) {
            self.picks.remove(pos);
            return TokenUpdate::Removed;
        }

        if self.picks.len() >= self.capacity {
            return TokenUpdate::Ignored;
        }

        self.picks.push(pick);
        if self.is_full() {
            TokenUpdate::Completed
        } else {
            TokenUpdate::Placed
        }
    }

    /// Drop tokens whose card has left the table, and every token placed
    /// before the table's current round
    ///
    /// # Returns
    ///
    /// * `Vec<Pick>` - The dropped tokens
    pub fn retain_present(&mut self, table: &Table) -> Vec<Pick> {
        let (kept, dropped): (Vec<Pick>, Vec<Pick>) = std::mem::take(&mut self.picks)
            .into_iter()
            .partition(|pick| table.holds(pick));
        self.picks = kept;
        dropped
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.picks.len() == self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Card;

    fn pick(slot: usize) -> Pick {
        Pick::new(slot, Card(slot as u32 * 2))
    }

    #[test]
    fn test_toggle_places_removes_and_completes() {
        let mut tokens = TokenSet::new(3);

        assert_eq!(tokens.toggle(pick(4)), TokenUpdate::Placed);
        assert_eq!(tokens.toggle(pick(4)), TokenUpdate::Removed);
        assert!(tokens.is_empty());

        assert_eq!(tokens.toggle(pick(1)), TokenUpdate::Placed);
        assert_eq!(tokens.toggle(pick(7)), TokenUpdate::Placed);
        assert_eq!(tokens.toggle(pick(3)), TokenUpdate::Completed);
        assert_eq!(tokens.picks(), &[pick(1), pick(7), pick(3)]);
    }

    #[test]
    fn test_full_set_only_accepts_removals() {
        let mut tokens = TokenSet::new(3);
        for slot in [0, 1, 2] {
            tokens.toggle(pick(slot));
        }

        assert_eq!(tokens.toggle(pick(5)), TokenUpdate::Ignored);
        assert_eq!(tokens.toggle(pick(1)), TokenUpdate::Removed);
        assert_eq!(tokens.toggle(pick(5)), TokenUpdate::Completed);
    }

    #[test]
    fn test_retain_present_drops_replaced_cards() {
        let mut table = Table::new(4);
        table.place(Card(0), 0);
        table.place(Card(2), 1);
        table.place(Card(99), 2);

        let mut tokens = TokenSet::new(3);
        for slot in [0, 1, 2] {
            tokens.toggle(pick(slot));
        }

        let dropped = tokens.retain_present(&table);
        assert_eq!(dropped, vec![pick(2)]);
        assert_eq!(tokens.picks(), &[pick(0), pick(1)]);
    }

    #[test]
    fn test_retain_present_drops_tokens_from_earlier_round() {
        let mut table = Table::new(4);
        for slot in [0, 1] {
            table.place(pick(slot).card, slot);
        }

        let mut tokens = TokenSet::new(3);
        tokens.toggle(pick(0));
        tokens.toggle(pick(1));

        // Swept and re-dealt into the very same slots
        for slot in [0, 1] {
            table.remove(slot);
        }
        table.advance_round();
        for slot in [0, 1] {
            table.place(pick(slot).card, slot);
        }

        let dropped = tokens.retain_present(&table);
        assert_eq!(dropped, vec![pick(0), pick(1)]);
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_blocked_states() {
        assert!(!PlayerState::AwaitingInput.is_blocked());
        assert!(PlayerState::AwaitingVerdict.is_blocked());
        assert!(PlayerState::Frozen(FreezeKind::Penalty).is_blocked());
        assert_eq!(PlayerState::Frozen(FreezeKind::Point).to_string(), "frozen (point)");
    }
}
