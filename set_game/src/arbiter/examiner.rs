//! Claim queue and the examination protocol.
//!
//! Everything here is synchronous. The arbiter actor drives it; every
//! examination holds the table's write guard from the staleness check to the
//! replacement deal, so no claim ever observes a half-rewritten table.

use super::messages::Claim;
use crate::{
    events::{EventSink, GameEvent},
    game::{
        deck::Deck,
        entities::{Card, Slot, Verdict},
        rules::CombinationRules,
        table::{SharedTable, Table},
    },
};
use rand::rngs::StdRng;
use serde::Serialize;
use std::{collections::VecDeque, sync::Arc};

/// Verdict tally over a whole game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExaminationStats {
    pub points: u32,
    pub penalties: u32,
    pub neutrals: u32,
}

impl ExaminationStats {
    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Point => self.points += 1,
            Verdict::Penalty => self.penalties += 1,
            Verdict::Neutral => self.neutrals += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.points + self.penalties + self.neutrals
    }
}

/// Owner of the deck, the pending claims and all table mutation
pub struct Examiner {
    table: SharedTable,
    deck: Deck,
    rules: Arc<dyn CombinationRules>,
    events: EventSink,
    rng: StdRng,
    pending: VecDeque<Claim>,
    stats: ExaminationStats,
}

impl Examiner {
    pub fn new(
        table: SharedTable,
        deck: Deck,
        rules: Arc<dyn CombinationRules>,
        events: EventSink,
        rng: StdRng,
    ) -> Self {
        Self {
            table,
            deck,
            rules,
            events,
            rng,
            pending: VecDeque::new(),
            stats: ExaminationStats::default(),
        }
    }

    pub fn table(&self) -> &SharedTable {
        &self.table
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn stats(&self) -> ExaminationStats {
        self.stats
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Append a claim to the queue, behind every claim received before it
    ///
    /// # Panics
    ///
    /// Panics if the claim does not hold exactly one claim's worth of picks.
    pub fn enqueue(&mut self, claim: Claim) {
        assert_eq!(
            claim.picks().len(),
            self.rules.claim_size(),
            "{} submitted a claim of the wrong size",
            claim.player()
        );
        log::debug!(
            "{} claim queued ({} ahead of it)",
            claim.player(),
            self.pending.len()
        );
        self.pending.push_back(claim);
    }

    /// Deal random cards from the deck into every empty slot
    ///
    /// # Returns
    ///
    /// * `usize` - Number of cards dealt
    pub fn deal(&mut self) -> usize {
        let mut table = self.table.write();
        fill_empty_slots(&mut table, &mut self.deck, &mut self.rng, &self.events)
    }

    /// Examine the oldest pending claim and deliver its verdict
    ///
    /// # Returns
    ///
    /// * `Option<Verdict>` - The verdict, or `None` if nothing was pending
    pub fn examine_next(&mut self) -> Option<Verdict> {
        let claim = self.pending.pop_front()?;
        let verdict = self.examine(&claim);
        log::debug!(
            "{} claim on {:?} examined: {}",
            claim.player(),
            claim.cards(),
            verdict
        );
        self.stats.record(verdict);
        claim.resolve(verdict);
        Some(verdict)
    }

    fn examine(&mut self, claim: &Claim) -> Verdict {
        let mut table = self.table.write();

        if !claim.picks().iter().all(|pick| table.holds(pick)) {
            return Verdict::Neutral;
        }

        if !self.rules.is_valid(&claim.cards()) {
            return Verdict::Penalty;
        }

        let removed: Vec<Slot> = claim.picks().iter().map(|pick| pick.slot).collect();
        for &slot in &removed {
            table.remove(slot);
            self.events.emit(GameEvent::TokensCleared { slot });
            self.events.emit(GameEvent::CardHidden { slot });
        }

        // Every other queued claim touching a removed slot is released unscored
        let (invalidated, kept): (Vec<Claim>, Vec<Claim>) = self
            .pending
            .drain(..)
            .partition(|other| removed.iter().any(|&slot| other.references(slot)));
        self.pending = kept.into();
        for other in invalidated {
            log::debug!("{} claim invalidated by {}", other.player(), claim.player());
            self.stats.record(Verdict::Neutral);
            other.resolve(Verdict::Neutral);
        }

        fill_empty_slots(&mut table, &mut self.deck, &mut self.rng, &self.events);
        Verdict::Point
    }

    /// Release every pending claim with a neutral verdict
    pub fn release_pending(&mut self) {
        for claim in self.pending.drain(..) {
            log::debug!("{} claim released unexamined", claim.player());
            self.stats.record(Verdict::Neutral);
            claim.resolve(Verdict::Neutral);
        }
    }

    /// Return every card on the table to the deck, releasing pending claims.
    ///
    /// Starts a new table round, so every token and buffered press players
    /// still hold goes stale even where a card is dealt back into its slot.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of cards returned
    pub fn sweep(&mut self) -> usize {
        self.release_pending();

        let mut table = self.table.write();
        let picks = table.picks();
        for pick in &picks {
            table.remove(pick.slot);
            self.deck.put_back(pick.card);
            self.events.emit(GameEvent::TokensCleared { slot: pick.slot });
            self.events.emit(GameEvent::CardHidden { slot: pick.slot });
        }
        table.advance_round();
        picks.len()
    }

    /// Whether a valid combination remains among the table and the deck
    pub fn has_combination(&self) -> bool {
        let mut cards = self.table.read().cards();
        cards.extend_from_slice(self.deck.cards());
        self.rules.has_valid(&cards)
    }

    /// Every valid combination currently on the table
    pub fn hints(&self) -> Vec<Vec<Card>> {
        let cards = self.table.read().cards();
        self.rules.find_valid(&cards, usize::MAX)
    }
}

fn fill_empty_slots(
    table: &mut Table,
    deck: &mut Deck,
    rng: &mut StdRng,
    events: &EventSink,
) -> usize {
    let mut dealt = 0;
    for slot in table.empty_slots() {
        let Some(card) = deck.draw(rng) else {
            break;
        };
        table.place(card, slot);
        events.emit(GameEvent::CardShown { slot, card });
        dealt += 1;
    }
    dealt
}
