//! All-or-nothing uniform-price matching for one closed bucket.
//!
//! ## Algorithm
//!
//! 1. Sort bids by unit price descending, asks ascending (both stable)
//! 2. Walk bids in order; each bid consumes asks from a running cursor
//! 3. A bid that cannot fill **completely** is rolled back: every ask it
//!    touched is restored and its tentative trades are discarded
//! 4. A bid that fills commits its trades and records the clearing price
//!    as the unit price of the ask that completed it
//! 5. The bucket's clearing price is the marginal ask of the *last*
//!    committed bid; zero when no bid fills
//!
//! Partial bid fills are never confirmed. Partial **ask** consumption is
//! normal: the leftover supply is reported as undemanded.
//!
//! ## Determinism
//!
//! Ties at equal prices resolve by insertion order (the stable sort).
//! Same input lists → same trades, same clearing price, same digest.

use gridclear_types::{
    checked_value, BucketId, GridclearError, Offer, Result, Trade, TradeBucket, TraderId,
};

use crate::sort::{sort_offers, Direction, SecondaryKey};

/// Outcome for one bid, in sorted-bid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidOutcome {
    pub trader: TraderId,
    pub offer_id: u64,
    /// Whether the bid filled completely.
    pub filled: bool,
    /// Money owed back to the bidder: the full escrow for a rejected
    /// bid, the overpayment `energy × (bid price − clearing price)` for
    /// a filled one. Zero when the bid paid exactly the clearing price.
    pub refund: u64,
}

/// Outcome for one ask with unconsumed supply, in sorted-ask order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AskOutcome {
    pub trader: TraderId,
    pub offer_id: u64,
    /// Units no bid absorbed. Asks post no escrow, so nothing is owed.
    pub remaining: u64,
}

/// The complete result of matching one bucket.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Sealed trades plus the uniform clearing price and result digest.
    pub trade_bucket: TradeBucket,
    /// Per-bid outcomes in sorted-bid order.
    pub bid_outcomes: Vec<BidOutcome>,
    /// Asks with leftover supply, in sorted-ask order.
    pub ask_outcomes: Vec<AskOutcome>,
}

/// Match a closed bucket's bids against its asks.
///
/// Pure: no ledger access, no clock, no side effects beyond tracing.
///
/// # Errors
/// `ArithmeticOverflow` if a refund computation exceeds `u64` (cannot
/// happen for offers the book validated, but checked regardless).
pub fn match_bucket(bucket_id: BucketId, bids: &[Offer], asks: &[Offer]) -> Result<MatchOutcome> {
    let sorted_bids = sort_offers(bids, Direction::Descending, SecondaryKey::None);
    let sorted_asks = sort_offers(asks, Direction::Ascending, SecondaryKey::None);

    // Working energy amounts, mutated during matching. Originals stay on
    // the sorted offers for refund computation.
    let mut bid_remaining: Vec<u64> = sorted_bids.iter().map(|b| b.energy_amount).collect();
    let mut ask_remaining: Vec<u64> = sorted_asks.iter().map(|a| a.energy_amount).collect();

    let mut trades: Vec<Trade> = Vec::new();
    let mut clearing_price: u64 = 0;
    let mut ask_cursor: usize = 0;

    for (bi, bid) in sorted_bids.iter().enumerate() {
        // No supply left this bid can afford: no later (cheaper) bid can
        // afford it either.
        if ask_cursor >= sorted_asks.len()
            || bid.unit_price < sorted_asks[ask_cursor].unit_price
        {
            break;
        }

        let mut tentative: Vec<Trade> = Vec::new();
        let mut touched: Vec<(usize, u64)> = Vec::new();
        let mut asks_emptied: usize = 0;

        let mut i = ask_cursor;
        while i < sorted_asks.len() {
            let ask = &sorted_asks[i];
            if bid.unit_price < ask.unit_price {
                break;
            }

            touched.push((i, ask_remaining[i]));
            let provision = bid_remaining[bi].min(ask_remaining[i]);
            bid_remaining[bi] -= provision;
            ask_remaining[i] -= provision;
            if ask_remaining[i] == 0 {
                asks_emptied += 1;
            }
            tentative.push(Trade {
                buyer: bid.trader,
                seller: ask.trader,
                energy_amount: provision,
                supplied: false,
            });

            if bid_remaining[bi] == 0 {
                clearing_price = ask.unit_price;
                break;
            }
            i += 1;
        }

        if bid_remaining[bi] > 0 {
            // Shortfall: this bid fills completely or not at all. Restore
            // every touched ask and move on; a smaller, cheaper bid may
            // still fill from the same supply.
            for (idx, saved) in touched {
                ask_remaining[idx] = saved;
            }
            tracing::warn!(
                bidder = %bid.trader.short(),
                offer_id = bid.offer_id,
                wanted = bid.energy_amount,
                "bid rolled back: demand unmeetable at bid price"
            );
            continue;
        }

        for trade in &tentative {
            tracing::debug!(
                buyer = %trade.buyer.short(),
                seller = %trade.seller.short(),
                energy = trade.energy_amount,
                "trade confirmed"
            );
        }
        trades.extend(tentative);
        ask_cursor += asks_emptied;
    }

    let mut bid_outcomes = Vec::with_capacity(sorted_bids.len());
    for (bi, bid) in sorted_bids.iter().enumerate() {
        if bid_remaining[bi] > 0 {
            // All-or-nothing means remaining == original: full escrow back.
            let refund = checked_value(bid_remaining[bi], bid.unit_price)?;
            bid_outcomes.push(BidOutcome {
                trader: bid.trader,
                offer_id: bid.offer_id,
                filled: false,
                refund,
            });
        } else {
            let premium = bid.unit_price.checked_sub(clearing_price).ok_or(
                GridclearError::ArithmeticOverflow {
                    context: "bid overpayment",
                },
            )?;
            let refund = checked_value(bid.energy_amount, premium)?;
            bid_outcomes.push(BidOutcome {
                trader: bid.trader,
                offer_id: bid.offer_id,
                filled: true,
                refund,
            });
        }
    }

    let ask_outcomes: Vec<AskOutcome> = sorted_asks
        .iter()
        .enumerate()
        .filter(|&(i, _)| ask_remaining[i] > 0)
        .map(|(i, ask)| AskOutcome {
            trader: ask.trader,
            offer_id: ask.offer_id,
            remaining: ask_remaining[i],
        })
        .collect();

    let trade_bucket = TradeBucket::seal(bucket_id, clearing_price, trades);

    tracing::info!(
        bucket = bucket_id.0,
        trades = trade_bucket.trades.len(),
        clearing_price,
        digest = trade_bucket.digest_hex(),
        "bucket matched"
    );

    Ok(MatchOutcome {
        trade_bucket,
        bid_outcomes,
        ask_outcomes,
    })
}
