//! Combination rules deciding which groups of cards score.
//!
//! The arbiter only talks to [`CombinationRules`]; [`FeatureRules`] is the
//! classic rule set where every card is a tuple of features and a group is
//! valid when each feature is either shared by all cards or different on
//! every card.

use super::entities::Card;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pure, stateless combination rule engine.
pub trait CombinationRules: Send + Sync {
    /// Number of cards in a claim
    fn claim_size(&self) -> usize;

    /// Whether the given cards form a valid combination
    fn is_valid(&self, cards: &[Card]) -> bool;

    /// Up to `limit` valid combinations among `cards`
    fn find_valid(&self, cards: &[Card], limit: usize) -> Vec<Vec<Card>> {
        let mut found = Vec::new();
        if limit == 0 {
            return found;
        }
        visit_combinations(cards, self.claim_size(), |group| {
            if self.is_valid(group) {
                found.push(group.to_vec());
            }
            found.len() < limit
        });
        found
    }

    /// Number of valid combinations among `cards`
    fn count_valid(&self, cards: &[Card]) -> usize {
        let mut count = 0;
        visit_combinations(cards, self.claim_size(), |group| {
            if self.is_valid(group) {
                count += 1;
            }
            true
        });
        count
    }

    fn has_valid(&self, cards: &[Card]) -> bool {
        !self.find_valid(cards, 1).is_empty()
    }
}

/// Call `visit` with every `k`-combination of `cards` in lexicographic index
/// order until it returns `false`.
pub fn visit_combinations<F>(cards: &[Card], k: usize, mut visit: F)
where
    F: FnMut(&[Card]) -> bool,
{
    let n = cards.len();
    if k == 0 || k > n {
        return;
    }

    let mut idx: Vec<usize> = (0..k).collect();
    let mut group: Vec<Card> = Vec::with_capacity(k);
    'outer: loop {
        group.clear();
        group.extend(idx.iter().map(|&i| cards[i]));
        if !visit(&group) {
            return;
        }

        let mut i = k;
        while i > 0 {
            i -= 1;
            if idx[i] < n - k + i {
                idx[i] += 1;
                for j in i + 1..k {
                    idx[j] = idx[j - 1] + 1;
                }
                continue 'outer;
            }
        }
        return;
    }
}

/// Feature-based rules: card `c` has `feature_count` features, feature `f`
/// being digit `f` of `c` written in base `feature_size`. A claim holds
/// `feature_size` cards.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FeatureRules {
    pub feature_count: u32,
    pub feature_size: u32,
}

impl Default for FeatureRules {
    fn default() -> Self {
        Self {
            feature_count: 4,
            feature_size: 3,
        }
    }
}

impl FeatureRules {
    pub fn new(feature_count: u32, feature_size: u32) -> Self {
        assert!(feature_size >= 2, "feature size must be at least 2");
        Self {
            feature_count,
            feature_size,
        }
    }

    /// Number of distinct cards
    pub fn deck_size(&self) -> usize {
        self.feature_size.pow(self.feature_count) as usize
    }

    pub fn feature(&self, card: Card, index: u32) -> u32 {
        (card.0 / self.feature_size.pow(index)) % self.feature_size
    }

    pub fn features(&self, card: Card) -> Vec<u32> {
        (0..self.feature_count)
            .map(|index| self.feature(card, index))
            .collect()
    }

    /// The unique card completing `cards` into a valid combination, if any.
    ///
    /// Expects `feature_size - 1` distinct cards.
    pub fn completing_card(&self, cards: &[Card]) -> Option<Card> {
        let size = self.feature_size as usize;
        if cards.len() + 1 != size || !all_distinct(cards) {
            return None;
        }

        let mut id = 0;
        for index in 0..self.feature_count {
            let values: HashSet<u32> = cards.iter().map(|&c| self.feature(c, index)).collect();
            let value = if values.len() == 1 {
                *values.iter().next()?
            } else if values.len() == size - 1 {
                (0..self.feature_size).find(|v| !values.contains(v))?
            } else {
                return None;
            };
            id += value * self.feature_size.pow(index);
        }

        let card = Card(id);
        (!cards.contains(&card)).then_some(card)
    }
}

impl CombinationRules for FeatureRules {
    fn claim_size(&self) -> usize {
        self.feature_size as usize
    }

    fn is_valid(&self, cards: &[Card]) -> bool {
        let size = self.claim_size();
        if cards.len() != size || !all_distinct(cards) {
            return false;
        }

        (0..self.feature_count).all(|index| {
            let values: HashSet<u32> = cards.iter().map(|&c| self.feature(c, index)).collect();
            values.len() == 1 || values.len() == size
        })
    }
}

fn all_distinct(cards: &[Card]) -> bool {
    let unique: HashSet<&Card> = cards.iter().collect();
    unique.len() == cards.len()
}
