//! Per-bucket order book.
//!
//! Two insertion-ordered append-only lists, one per side. Insertion
//! order matters only for `offer_id` assignment and event emission;
//! matching runs on the sorted view produced by [`crate::sort_offers`].
//!
//! The book validates offer shape (positive energy, positive price,
//! escrow value = energy × price for bids). Gating on bucket status is
//! the controller's job.

use gridclear_types::{constants, GridclearError, Offer, Result, TraderId, checked_value};

/// Insertion-ordered bid and ask lists for one bucket.
#[derive(Debug, Default)]
pub struct BucketBook {
    bids: Vec<Offer>,
    asks: Vec<Offer>,
}

impl BucketBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a bid without mutating the book.
    ///
    /// # Errors
    /// - `InvalidOrder` with a distinct reason for zero energy, zero
    ///   price, or an escrow value that does not equal `energy × price`
    /// - `BookFull` at side capacity
    /// - `ArithmeticOverflow` if `energy × price` exceeds `u64`
    pub fn validate_bid(&self, energy: u64, price: u64, value: u64) -> Result<()> {
        validate_shape(energy, price)?;
        let expected = checked_value(energy, price)?;
        if value != expected {
            return Err(GridclearError::InvalidOrder {
                reason: format!(
                    "escrowed value {value} does not equal energy x unit price {expected}"
                ),
            });
        }
        self.check_capacity(self.bids.len())
    }

    /// Validate an ask without mutating the book.
    ///
    /// # Errors
    /// `InvalidOrder` for zero energy or zero price; `BookFull` at capacity.
    pub fn validate_ask(&self, energy: u64, price: u64) -> Result<()> {
        validate_shape(energy, price)?;
        self.check_capacity(self.asks.len())
    }

    /// Append a bid, assigning `offer_id` = pre-append length.
    ///
    /// # Errors
    /// Same as [`Self::validate_bid`].
    pub fn append_bid(&mut self, trader: TraderId, energy: u64, price: u64, value: u64) -> Result<u64> {
        self.validate_bid(energy, price, value)?;
        Ok(push_offer(&mut self.bids, trader, energy, price))
    }

    /// Append an ask, assigning `offer_id` = pre-append length.
    ///
    /// # Errors
    /// Same as [`Self::validate_ask`].
    pub fn append_ask(&mut self, trader: TraderId, energy: u64, price: u64) -> Result<u64> {
        self.validate_ask(energy, price)?;
        Ok(push_offer(&mut self.asks, trader, energy, price))
    }

    #[must_use]
    pub fn bids(&self) -> &[Offer] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[Offer] {
        &self.asks
    }

    #[must_use]
    pub fn bid(&self, index: u64) -> Option<&Offer> {
        usize::try_from(index).ok().and_then(|i| self.bids.get(i))
    }

    #[must_use]
    pub fn ask(&self, index: u64) -> Option<&Offer> {
        usize::try_from(index).ok().and_then(|i| self.asks.get(i))
    }

    /// Total escrow posted against this book's bids.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the sum exceeds `u64`.
    pub fn total_bid_escrow(&self) -> Result<u64> {
        let mut total: u64 = 0;
        for bid in &self.bids {
            total = total
                .checked_add(bid.notional()?)
                .ok_or(GridclearError::ArithmeticOverflow {
                    context: "total bid escrow",
                })?;
        }
        Ok(total)
    }

    fn check_capacity(&self, side_len: usize) -> Result<()> {
        if side_len >= constants::MAX_OFFERS_PER_SIDE {
            return Err(GridclearError::BookFull);
        }
        Ok(())
    }
}

fn validate_shape(energy: u64, price: u64) -> Result<()> {
    if energy == 0 {
        return Err(GridclearError::InvalidOrder {
            reason: "energy amount must be positive".into(),
        });
    }
    if price == 0 {
        return Err(GridclearError::InvalidOrder {
            reason: "unit price must be positive".into(),
        });
    }
    Ok(())
}

fn push_offer(side: &mut Vec<Offer>, trader: TraderId, energy: u64, price: u64) -> u64 {
    let offer_id = side.len() as u64;
    side.push(Offer {
        trader,
        energy_amount: energy,
        unit_price: price,
        offer_id,
    });
    offer_id
}
