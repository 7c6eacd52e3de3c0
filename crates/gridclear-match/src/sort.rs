//! Stable price ordering over offer lists.
//!
//! Matching consumes bids sorted by unit price descending and asks
//! ascending. The sort must be stable — offers at equal prices keep
//! their insertion order, which is the engine's documented tie-break —
//! and deterministic, so test vectors reproduce.

use gridclear_types::Offer;

/// Sort direction over unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Secondary ordering key. Vestigial: accepted for API compatibility
/// and ignored; the price-primary ordering alone is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryKey {
    None,
    EnergyAmount,
}

/// Return a copy of `offers` stably ordered by unit price.
///
/// Equal-priced offers retain their input order.
#[must_use]
pub fn sort_offers(offers: &[Offer], direction: Direction, _secondary: SecondaryKey) -> Vec<Offer> {
    let mut sorted = offers.to_vec();
    // Vec::sort_by is a stable merge sort.
    match direction {
        Direction::Ascending => sorted.sort_by(|a, b| a.unit_price.cmp(&b.unit_price)),
        Direction::Descending => sorted.sort_by(|a, b| b.unit_price.cmp(&a.unit_price)),
    }
    sorted
}

#[cfg(test)]
mod tests {
    use gridclear_types::TraderId;

    use super::*;

    fn offer(price: u64, offer_id: u64) -> Offer {
        Offer {
            trader: TraderId::new(),
            energy_amount: 1,
            unit_price: price,
            offer_id,
        }
    }

    #[test]
    fn ascending_orders_low_to_high() {
        let offers = vec![offer(5, 0), offer(1, 1), offer(3, 2)];
        let sorted = sort_offers(&offers, Direction::Ascending, SecondaryKey::None);
        let prices: Vec<u64> = sorted.iter().map(|o| o.unit_price).collect();
        assert_eq!(prices, vec![1, 3, 5]);
    }

    #[test]
    fn descending_orders_high_to_low() {
        let offers = vec![offer(5, 0), offer(1, 1), offer(3, 2)];
        let sorted = sort_offers(&offers, Direction::Descending, SecondaryKey::None);
        let prices: Vec<u64> = sorted.iter().map(|o| o.unit_price).collect();
        assert_eq!(prices, vec![5, 3, 1]);
    }

    #[test]
    fn equal_prices_keep_insertion_order() {
        let offers = vec![offer(2, 0), offer(2, 1), offer(1, 2), offer(2, 3)];
        let sorted = sort_offers(&offers, Direction::Descending, SecondaryKey::None);
        let ids: Vec<u64> = sorted.iter().map(|o| o.offer_id).collect();
        assert_eq!(ids, vec![0, 1, 3, 2]);
    }

    #[test]
    fn secondary_key_is_ignored() {
        let offers = vec![offer(2, 0), offer(2, 1)];
        let with = sort_offers(&offers, Direction::Ascending, SecondaryKey::EnergyAmount);
        let without = sort_offers(&offers, Direction::Ascending, SecondaryKey::None);
        let ids_with: Vec<u64> = with.iter().map(|o| o.offer_id).collect();
        let ids_without: Vec<u64> = without.iter().map(|o| o.offer_id).collect();
        assert_eq!(ids_with, ids_without);
    }

    #[test]
    fn empty_input() {
        assert!(sort_offers(&[], Direction::Ascending, SecondaryKey::None).is_empty());
    }
}
