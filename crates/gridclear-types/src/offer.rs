//! Offer types for the gridclear order book.
//!
//! A single [`Offer`] shape serves both sides: the book keeps bids and
//! asks in separate insertion-ordered lists, so the side lives with the
//! list, not the offer. A bid's escrowed value (`energy × unit_price`)
//! is held by the escrow ledger, not stored on the offer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GridclearError, Result, TraderId};

/// Which side of the book an offer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "BID"),
            Self::Ask => write!(f, "ASK"),
        }
    }
}

/// A buy or sell offer within one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// The participant that placed this offer.
    pub trader: TraderId,
    /// Units of energy offered or demanded. Always positive.
    pub energy_amount: u64,
    /// Price per unit. Always positive.
    pub unit_price: u64,
    /// Ordinal within this bucket/side, assigned on insertion.
    pub offer_id: u64,
}

impl Offer {
    /// Total value of this offer: `energy_amount × unit_price`.
    ///
    /// For a bid this equals the escrow the bidder must post.
    ///
    /// # Errors
    /// Returns `ArithmeticOverflow` if the product exceeds `u64`.
    pub fn notional(&self) -> Result<u64> {
        checked_value(self.energy_amount, self.unit_price)
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Offer[{}] {} x {} by {}",
            self.offer_id,
            self.energy_amount,
            self.unit_price,
            self.trader.short(),
        )
    }
}

/// Checked `energy × unit_price`, widened through `u128`.
///
/// # Errors
/// Returns `ArithmeticOverflow` if the product exceeds `u64`.
pub fn checked_value(energy: u64, unit_price: u64) -> Result<u64> {
    let wide = u128::from(energy) * u128::from(unit_price);
    u64::try_from(wide).map_err(|_| GridclearError::ArithmeticOverflow {
        context: "offer value",
    })
}
