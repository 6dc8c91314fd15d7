/// Property-based tests for the combination rules using proptest
///
/// These tests check the feature rules against their defining property:
/// any two distinct cards are completed by exactly one third card.
use set_game::game::{
    deck::Deck,
    entities::Card,
    rules::{CombinationRules, FeatureRules},
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::BTreeSet;

// Strategy to generate a card from the classic 81-card deck
fn card_strategy() -> impl Strategy<Value = Card> {
    (0u32..81).prop_map(Card)
}

// Strategy to generate a vec of unique cards (no duplicates)
fn unique_cards_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::btree_set(card_strategy(), min..=max)
        .prop_map(|cards| cards.into_iter().collect())
}

proptest! {
    #[test]
    fn test_two_cards_have_one_completion(pair in unique_cards_strategy(2, 2)) {
        let rules = FeatureRules::default();
        let third = rules.completing_card(&pair);

        prop_assert!(third.is_some(), "every pair should be completable");
        let third = third.unwrap();
        prop_assert!(!pair.contains(&third));

        let group = vec![pair[0], pair[1], third];
        prop_assert!(rules.is_valid(&group));

        // No other card completes the pair
        let others = (0..81)
            .map(Card)
            .filter(|&c| c != third && !pair.contains(&c))
            .filter(|&c| rules.is_valid(&[pair[0], pair[1], c]))
            .count();
        prop_assert_eq!(others, 0);
    }

    #[test]
    fn test_validity_ignores_order(group in unique_cards_strategy(3, 3)) {
        let rules = FeatureRules::default();
        let expected = rules.is_valid(&group);

        let (a, b, c) = (group[0], group[1], group[2]);
        for permutation in [[a, c, b], [b, a, c], [b, c, a], [c, a, b], [c, b, a]] {
            prop_assert_eq!(rules.is_valid(&permutation), expected);
        }
    }

    #[test]
    fn test_find_valid_agrees_with_count(hand in unique_cards_strategy(3, 15)) {
        let rules = FeatureRules::default();
        let found = rules.find_valid(&hand, usize::MAX);

        prop_assert_eq!(found.len(), rules.count_valid(&hand));
        prop_assert_eq!(rules.has_valid(&hand), !found.is_empty());
        for group in &found {
            prop_assert!(rules.is_valid(group));
        }
    }

    #[test]
    fn test_deck_draw_never_repeats(size in 1usize..100, seed in any::<u64>()) {
        let mut deck = Deck::new(size);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut drawn = BTreeSet::new();
        while let Some(card) = deck.draw(&mut rng) {
            prop_assert!(drawn.insert(card), "card {} drawn twice", card);
        }
        prop_assert_eq!(drawn.len(), size);
    }
}
