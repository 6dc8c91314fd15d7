//! Slot/card mapping shared between the arbiter and the players.

use super::entities::{Card, Pick, Slot};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError},
};

/// Authoritative slot <-> card mapping.
///
/// Only the arbiter mutates a table; players read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    slot_to_card: Vec<Option<Card>>,
    card_to_slot: HashMap<Card, Slot>,
    /// Bumped by every end-of-round sweep
    round: u32,
}

impl Table {
    /// Create an empty table with `size` slots
    pub fn new(size: usize) -> Self {
        Self {
            slot_to_card: vec![None; size],
            card_to_slot: HashMap::with_capacity(size),
            round: 0,
        }
    }

    /// Number of slots
    pub fn size(&self) -> usize {
        self.slot_to_card.len()
    }

    /// Place a card in an empty slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is out of range, already holds a card, or the card
    /// is already on the table. Only the arbiter places cards, so any of these
    /// is a bookkeeping bug.
    pub fn place(&mut self, card: Card, slot: Slot) {
        assert!(slot < self.size(), "slot {slot} out of range");
        assert!(
            self.slot_to_card[slot].is_none(),
            "slot {slot} already holds a card"
        );
        let previous = self.card_to_slot.insert(card, slot);
        assert!(previous.is_none(), "card {card} is already on the table");
        self.slot_to_card[slot] = Some(card);
    }

    /// Remove and return the card in a slot, if any
    pub fn remove(&mut self, slot: Slot) -> Option<Card> {
        let card = self.slot_to_card.get_mut(slot)?.take()?;
        self.card_to_slot.remove(&card);
        Some(card)
    }

    /// Number of slots currently holding a card
    pub fn occupied_count(&self) -> usize {
        self.card_to_slot.len()
    }

    pub fn card_at(&self, slot: Slot) -> Option<Card> {
        self.slot_to_card.get(slot).copied().flatten()
    }

    pub fn slot_of(&self, card: Card) -> Option<Slot> {
        self.card_to_slot.get(&card).copied()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Start a new table round. Picks made before it no longer hold, even
    /// if their card is dealt back into the same slot.
    pub fn advance_round(&mut self) {
        self.round = self.round.wrapping_add(1);
    }

    /// The card in a slot as seen right now
    pub fn pick_at(&self, slot: Slot) -> Option<Pick> {
        self.card_at(slot).map(|card| Pick::new(slot, card).in_round(self.round))
    }

    /// Whether the picked slot still holds the picked card, within the
    /// round the pick was made in
    pub fn holds(&self, pick: &Pick) -> bool {
        pick.round == self.round && self.card_at(pick.slot) == Some(pick.card)
    }

    pub fn empty_slots(&self) -> Vec<Slot> {
        self.slot_to_card
            .iter()
            .enumerate()
            .filter_map(|(slot, card)| card.is_none().then_some(slot))
            .collect()
    }

    /// Occupied slots in slot order
    pub fn picks(&self) -> Vec<Pick> {
        (0..self.size()).filter_map(|slot| self.pick_at(slot)).collect()
    }

    /// Cards on the table in slot order
    pub fn cards(&self) -> Vec<Card> {
        self.slot_to_card.iter().flatten().copied().collect()
    }
}

/// Cloneable handle to a table behind a reader/writer lock.
///
/// Critical sections are short and never span an await point. A poisoned
/// lock is recovered rather than propagated: every table mutation leaves
/// both maps consistent before anything that could panic.
#[derive(Debug, Clone)]
pub struct SharedTable(Arc<RwLock<Table>>);

impl SharedTable {
    pub fn new(size: usize) -> Self {
        Self(Arc::new(RwLock::new(Table::new(size))))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read without waiting; `None` while the arbiter is rewriting the table
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, Table>> {
        match self.0.try_read() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}
