use super::entities::Card;
use rand::Rng;

/// Cards that are not currently on the table.
///
/// Draws are uniformly random; the deck keeps no order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A full deck holding every identifier in `[0, size)`
    pub fn new(size: usize) -> Self {
        Self {
            cards: (0..size as u32).map(Card).collect(),
        }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Remove and return a random card
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Card> {
        if self.cards.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.cards.len());
        Some(self.cards.swap_remove(idx))
    }

    pub fn put_back(&mut self, card: Card) {
        debug_assert!(!self.cards.contains(&card), "card {card} already in deck");
        self.cards.push(card);
    }
}
