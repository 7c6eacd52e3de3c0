//! Property-based tests for the stable price ordering.
//!
//! For any offer list and either direction: the output is a permutation
//! of the input, adjacent elements satisfy the non-strict comparison in
//! the chosen direction, and equal-priced elements retain input order.

use gridclear_match::{sort_offers, Direction, SecondaryKey};
use gridclear_types::{Offer, TraderId};
use proptest::prelude::*;

fn arb_offers() -> impl Strategy<Value = Vec<Offer>> {
    prop::collection::vec((1u64..100, 1u64..1000), 0..60).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (energy, price))| Offer {
                trader: TraderId::from_bytes((i as u128).to_be_bytes()),
                energy_amount: energy,
                unit_price: price,
                offer_id: i as u64,
            })
            .collect()
    })
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Ascending), Just(Direction::Descending)]
}

fn arb_secondary() -> impl Strategy<Value = SecondaryKey> {
    prop_oneof![Just(SecondaryKey::None), Just(SecondaryKey::EnergyAmount)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn output_is_permutation_of_input(
        offers in arb_offers(),
        direction in arb_direction(),
        secondary in arb_secondary(),
    ) {
        let sorted = sort_offers(&offers, direction, secondary);
        prop_assert_eq!(sorted.len(), offers.len());

        let mut input_ids: Vec<u64> = offers.iter().map(|o| o.offer_id).collect();
        let mut output_ids: Vec<u64> = sorted.iter().map(|o| o.offer_id).collect();
        input_ids.sort_unstable();
        output_ids.sort_unstable();
        prop_assert_eq!(input_ids, output_ids);
    }

    #[test]
    fn adjacent_elements_respect_direction(
        offers in arb_offers(),
        direction in arb_direction(),
        secondary in arb_secondary(),
    ) {
        let sorted = sort_offers(&offers, direction, secondary);
        for pair in sorted.windows(2) {
            match direction {
                Direction::Ascending => {
                    prop_assert!(pair[0].unit_price <= pair[1].unit_price);
                }
                Direction::Descending => {
                    prop_assert!(pair[0].unit_price >= pair[1].unit_price);
                }
            }
        }
    }

    #[test]
    fn equal_prices_preserve_insertion_order(
        offers in arb_offers(),
        direction in arb_direction(),
        secondary in arb_secondary(),
    ) {
        let sorted = sort_offers(&offers, direction, secondary);
        for pair in sorted.windows(2) {
            if pair[0].unit_price == pair[1].unit_price {
                // offer_id is the insertion ordinal.
                prop_assert!(pair[0].offer_id < pair[1].offer_id);
            }
        }
    }

    #[test]
    fn sorting_is_deterministic(
        offers in arb_offers(),
        direction in arb_direction(),
    ) {
        let a = sort_offers(&offers, direction, SecondaryKey::None);
        let b = sort_offers(&offers, direction, SecondaryKey::None);
        prop_assert_eq!(a, b);
    }
}
