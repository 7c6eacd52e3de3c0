//! Trade types produced by the gridclear matcher.
//!
//! A [`Trade`] is one seller's contribution toward one buyer's fully
//! filled demand. A [`TradeBucket`] is the per-bucket result: the uniform
//! clearing price plus every confirmed trade in commitment order, sealed
//! with a deterministic digest so matching can be verified reproducible.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{BucketId, GridclearError, Result, TraderId, checked_value};

/// A confirmed match between one buyer and one seller.
///
/// A single bid may generate several trades (one per participating ask),
/// but every trade's buyer is exactly one bidder. Once `supplied` flips
/// to `true` the trade is terminal: the seller has been paid and the
/// trade is skipped by the next reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub buyer: TraderId,
    pub seller: TraderId,
    /// Units transacted. Always positive.
    pub energy_amount: u64,
    /// Whether the seller has marked delivery and been paid.
    pub supplied: bool,
}

/// The result of matching one bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeBucket {
    /// Uniform price applied to every trade in this bucket. Zero when no
    /// bid filled.
    pub clearing_price: u64,
    /// Confirmed trades in commitment order; `trade_id` is the index.
    pub trades: Vec<Trade>,
    /// SHA-256 digest over the ordered match output.
    pub result_digest: [u8; 32],
}

impl TradeBucket {
    /// Seal a match result, computing the deterministic digest.
    ///
    /// `SHA-256(domain_sep || bucket_id || clearing_price || num_trades ||
    /// for each trade: buyer || seller || energy)`
    #[must_use]
    pub fn seal(bucket_id: BucketId, clearing_price: u64, trades: Vec<Trade>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"gridclear:trades:v1:");
        hasher.update(bucket_id.0.to_le_bytes());
        hasher.update(clearing_price.to_le_bytes());
        hasher.update((trades.len() as u64).to_le_bytes());
        for trade in &trades {
            hasher.update(trade.buyer.0.as_bytes());
            hasher.update(trade.seller.0.as_bytes());
            hasher.update(trade.energy_amount.to_le_bytes());
        }
        let result_digest: [u8; 32] = hasher.finalize().into();

        Self {
            clearing_price,
            trades,
            result_digest,
        }
    }

    /// Number of trades in this bucket.
    #[must_use]
    pub fn trade_count(&self) -> u64 {
        self.trades.len() as u64
    }

    /// Look up a trade by its ordinal.
    ///
    /// # Errors
    /// Returns `InvalidTrade` if `trade_id` is out of range.
    pub fn trade(&self, bucket_id: BucketId, trade_id: u64) -> Result<&Trade> {
        usize::try_from(trade_id)
            .ok()
            .and_then(|i| self.trades.get(i))
            .ok_or(GridclearError::InvalidTrade {
                bucket_id,
                trade_id,
            })
    }

    /// Payment owed for a trade: `energy × clearing_price`.
    ///
    /// # Errors
    /// Returns `InvalidTrade` for an out-of-range id, `ArithmeticOverflow`
    /// if the product exceeds `u64`.
    pub fn payment_due(&self, bucket_id: BucketId, trade_id: u64) -> Result<u64> {
        let trade = self.trade(bucket_id, trade_id)?;
        checked_value(trade.energy_amount, self.clearing_price)
    }

    /// Iterate over trades not yet marked supplied, with their ordinals.
    pub fn unsupplied(&self) -> impl Iterator<Item = (u64, &Trade)> {
        self.trades
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.supplied)
            .map(|(i, t)| (i as u64, t))
    }

    /// Hex form of the result digest, for logs.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.result_digest)
    }
}
