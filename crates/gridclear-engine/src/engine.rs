//! The auction engine: bucket lifecycle, order intake, roll, delivery.
//!
//! Strictly sequential: every operation runs to completion against the
//! whole engine state, and `roll` is the single operator entry point
//! that closes a bucket, matches it, disburses refunds, reconciles the
//! previous bucket, and opens the next.
//!
//! ## Roll atomicity
//!
//! `roll` computes its entire outcome — expiry payouts, match result,
//! refund payouts — against immutable state, then executes one
//! all-or-nothing payout batch, and only then applies state mutations
//! and emits events. A failed transfer aborts with no visible change.
//!
//! ## Event order within a roll
//!
//! Expiry records first, then rejected bids in sorted-bid order, then
//! rejected asks in sorted-ask order, then matched trades in commitment
//! order.

use std::collections::BTreeMap;

use gridclear_match::{match_bucket, BucketBook};
use gridclear_types::{
    BucketId, BucketStatus, EngineConfig, EngineEvent, EventSink, ExpiryBeneficiary,
    GridclearError, Offer, RejectReason, Result, Side, TradeBucket, TraderId,
};

use crate::clock::Clock;
use crate::conservation;
use crate::escrow::{EscrowLedger, ValueTransfer};

/// Periodic uniform-price double auction engine.
pub struct AuctionEngine {
    owner: TraderId,
    config: EngineConfig,
    ledger: EscrowLedger,
    clock: Box<dyn Clock>,
    sink: Box<dyn EventSink>,
    current_bucket_id: BucketId,
    current_start: u64,
    /// Dense status map; every bucket ever opened keeps an entry.
    statuses: BTreeMap<BucketId, BucketStatus>,
    /// Offer books for the open bucket and the last closed one; purged
    /// when a bucket is cleared.
    books: BTreeMap<BucketId, BucketBook>,
    /// Match results for every rolled bucket, kept forever.
    trade_buckets: BTreeMap<BucketId, TradeBucket>,
}

impl AuctionEngine {
    /// Construct the engine. The caller becomes the owner; bucket 0
    /// opens immediately and `OwnerAnnounce` is emitted.
    #[must_use]
    pub fn new(
        owner: TraderId,
        config: EngineConfig,
        vault: Box<dyn ValueTransfer>,
        clock: Box<dyn Clock>,
        mut sink: Box<dyn EventSink>,
    ) -> Self {
        let now = clock.now();
        sink.emit(EngineEvent::OwnerAnnounce { owner });
        tracing::info!(
            owner = %owner.short(),
            bucket_duration_secs = config.bucket_duration_secs,
            "auction engine constructed"
        );

        let mut statuses = BTreeMap::new();
        statuses.insert(BucketId(0), BucketStatus::Open);
        let mut books = BTreeMap::new();
        books.insert(BucketId(0), BucketBook::new());

        Self {
            owner,
            config,
            ledger: EscrowLedger::new(vault),
            clock,
            sink,
            current_bucket_id: BucketId(0),
            current_start: now,
            statuses,
            books,
            trade_buckets: BTreeMap::new(),
        }
    }

    // -----------------------------------------------------------------
    // Order intake
    // -----------------------------------------------------------------

    /// Append a bid to the open bucket, escrowing `value`.
    ///
    /// Returns the assigned `offer_id`.
    ///
    /// # Errors
    /// `InvalidOrder` (distinct reasons for zero energy, zero price,
    /// escrow mismatch), `BookFull`, `ArithmeticOverflow`.
    pub fn submit_bid(
        &mut self,
        trader: TraderId,
        energy: u64,
        price: u64,
        value: u64,
    ) -> Result<u64> {
        let bucket_id = self.current_bucket_id;
        self.open_book()?.validate_bid(energy, price, value)?;
        self.ledger.deposit(value)?;
        let offer_id = self
            .open_book_mut()?
            .append_bid(trader, energy, price, value)?;

        self.sink.emit(EngineEvent::TradeReceived {
            trader,
            bucket_id,
            side: Side::Bid,
            offer_id,
            energy,
            price,
        });
        tracing::debug!(
            trader = %trader.short(),
            bucket = bucket_id.0,
            offer_id,
            energy,
            price,
            "bid received"
        );
        Ok(offer_id)
    }

    /// Append an ask to the open bucket. Asks post no escrow.
    ///
    /// Returns the assigned `offer_id`.
    ///
    /// # Errors
    /// `InvalidOrder` for zero energy or zero price, `BookFull`.
    pub fn submit_ask(&mut self, trader: TraderId, energy: u64, price: u64) -> Result<u64> {
        let bucket_id = self.current_bucket_id;
        let offer_id = self.open_book_mut()?.append_ask(trader, energy, price)?;

        self.sink.emit(EngineEvent::TradeReceived {
            trader,
            bucket_id,
            side: Side::Ask,
            offer_id,
            energy,
            price,
        });
        tracing::debug!(
            trader = %trader.short(),
            bucket = bucket_id.0,
            offer_id,
            energy,
            price,
            "ask received"
        );
        Ok(offer_id)
    }

    // -----------------------------------------------------------------
    // Roll
    // -----------------------------------------------------------------

    /// Close the open bucket, match it, disburse refunds, reconcile the
    /// previous bucket, and open the next.
    ///
    /// # Errors
    /// - `Unauthorized` for a non-owner caller
    /// - `TooEarly` before the bucket has lived its full duration
    /// - `LedgerFailure` if any payout fails (nothing is applied)
    /// - `EscrowInvariant` if conservation breaks (critical)
    pub fn roll(&mut self, caller: TraderId) -> Result<()> {
        if caller != self.owner {
            return Err(GridclearError::Unauthorized {
                reason: "only the owner may roll".into(),
            });
        }
        let now = self.clock.now();
        let elapsed = now.saturating_sub(self.current_start);
        if elapsed < self.config.bucket_duration_secs {
            return Err(GridclearError::TooEarly {
                elapsed,
                required: self.config.bucket_duration_secs,
            });
        }

        let rolled = self.current_bucket_id;
        let previous = rolled.prev();

        // 1. Plan reconciliation of the previous bucket's unsupplied trades.
        let mut payouts: Vec<(TraderId, u64)> = Vec::new();
        let mut expired_events: Vec<EngineEvent> = Vec::new();
        if let Some(prev_id) = previous {
            let tb = self.trade_buckets.get(&prev_id).ok_or_else(|| {
                GridclearError::Internal(format!("rolled {prev_id} has no trade bucket"))
            })?;
            for (trade_id, trade) in tb.unsupplied() {
                let refund = tb.payment_due(prev_id, trade_id)?;
                let beneficiary = match self.config.expiry_beneficiary {
                    ExpiryBeneficiary::Seller => trade.seller,
                    ExpiryBeneficiary::Buyer => trade.buyer,
                };
                payouts.push((beneficiary, refund));
                expired_events.push(EngineEvent::TradeExpired {
                    buyer: trade.buyer,
                    seller: trade.seller,
                    bucket_id: prev_id,
                    trade_id,
                    refund,
                });
            }
        }

        // 2. Match the bucket being closed.
        let book = self.book(rolled)?;
        let outcome = match_bucket(rolled, book.bids(), book.asks())?;

        // 3. Plan refunds: full escrow for rejected bids, overpayment
        //    for filled ones (the ledger skips zero amounts).
        for bid in &outcome.bid_outcomes {
            payouts.push((bid.trader, bid.refund));
        }

        // 4. One atomic payout batch. Failure aborts the roll with no
        //    visible state change.
        self.ledger.disburse_batch(&payouts)?;

        // 5. Apply state: clear + purge previous, close rolled, open next.
        if let Some(prev_id) = previous {
            self.statuses.insert(prev_id, BucketStatus::Cleared);
            self.books.remove(&prev_id);
        }
        self.statuses.insert(rolled, BucketStatus::Closed);
        let next = rolled.next();
        self.current_bucket_id = next;
        self.current_start = now;
        self.statuses.insert(next, BucketStatus::Open);
        self.books.insert(next, BucketBook::new());

        // 6. Emit in the documented order: expired, rejected bids,
        //    rejected asks, matched.
        for event in expired_events {
            self.sink.emit(event);
        }
        for bid in outcome.bid_outcomes.iter().filter(|b| !b.filled) {
            self.sink.emit(EngineEvent::TradeRejected {
                trader: bid.trader,
                bucket_id: rolled,
                side: Side::Bid,
                offer_id: bid.offer_id,
                refund: bid.refund,
                reason: RejectReason::UnmeetableDemand,
            });
        }
        for ask in &outcome.ask_outcomes {
            self.sink.emit(EngineEvent::TradeRejected {
                trader: ask.trader,
                bucket_id: rolled,
                side: Side::Ask,
                offer_id: ask.offer_id,
                refund: 0,
                reason: RejectReason::UndemandedSupply,
            });
        }
        let trade_bucket = outcome.trade_bucket;
        for (trade_id, trade) in trade_bucket.trades.iter().enumerate() {
            self.sink.emit(EngineEvent::TradeMatched {
                buyer: trade.buyer,
                seller: trade.seller,
                bucket_id: rolled,
                trade_id: trade_id as u64,
                energy: trade.energy_amount,
                clearing_price: trade_bucket.clearing_price,
                supplied: trade.supplied,
            });
        }

        tracing::info!(
            bucket = rolled.0,
            trades = trade_bucket.trades.len(),
            clearing_price = trade_bucket.clearing_price,
            digest = trade_bucket.digest_hex(),
            "bucket rolled"
        );
        self.trade_buckets.insert(rolled, trade_bucket);

        self.verify_conservation()
    }

    // -----------------------------------------------------------------
    // Delivery settlement
    // -----------------------------------------------------------------

    /// Seller marks a trade delivered and collects payment.
    ///
    /// Only possible before the next roll reconciles the trade's bucket.
    ///
    /// # Errors
    /// - lookup errors for unknown buckets / unrolled buckets
    /// - `InvalidTrade` for an out-of-range trade id
    /// - `Unauthorized` if the caller is not the trade's seller
    /// - `AlreadySupplied` on a second call (idempotency guard)
    /// - `DeliveryWindowClosed` once the bucket is cleared
    /// - `LedgerFailure` if the payment fails (state unchanged)
    pub fn mark_delivered(
        &mut self,
        caller: TraderId,
        bucket_id: BucketId,
        trade_id: u64,
    ) -> Result<()> {
        let status = *self
            .statuses
            .get(&bucket_id)
            .ok_or(GridclearError::BucketNotFound(bucket_id))?;
        let tb = self
            .trade_buckets
            .get(&bucket_id)
            .ok_or(GridclearError::TradeBucketNotFound(bucket_id))?;
        let trade = *tb.trade(bucket_id, trade_id)?;

        if trade.seller != caller {
            return Err(GridclearError::Unauthorized {
                reason: "only the trade's seller may mark delivery".into(),
            });
        }
        if trade.supplied {
            return Err(GridclearError::AlreadySupplied {
                bucket_id,
                trade_id,
            });
        }
        if status == BucketStatus::Cleared {
            return Err(GridclearError::DeliveryWindowClosed {
                bucket_id,
                trade_id,
            });
        }

        let payment = tb.payment_due(bucket_id, trade_id)?;
        self.ledger.disburse(&caller, payment)?;

        let tb = self
            .trade_buckets
            .get_mut(&bucket_id)
            .ok_or_else(|| GridclearError::Internal(format!("{bucket_id} trade bucket vanished")))?;
        tb.trades[trade_id as usize].supplied = true;

        self.sink.emit(EngineEvent::EnergySupplied {
            seller: caller,
            buyer: trade.buyer,
            bucket_id,
            trade_id,
            energy: trade.energy_amount,
            payment,
        });
        tracing::debug!(
            seller = %caller.short(),
            bucket = bucket_id.0,
            trade_id,
            payment,
            "delivery marked"
        );

        self.verify_conservation()
    }

    // -----------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------

    #[must_use]
    pub fn owner(&self) -> TraderId {
        self.owner
    }

    #[must_use]
    pub fn current_bucket_id(&self) -> BucketId {
        self.current_bucket_id
    }

    /// Start time (engine clock seconds) of the open bucket.
    #[must_use]
    pub fn current_bucket_start_time(&self) -> u64 {
        self.current_start
    }

    /// Pooled escrow currently held by the ledger.
    #[must_use]
    pub fn escrow_held(&self) -> u64 {
        self.ledger.held()
    }

    /// Status of any bucket ever opened.
    ///
    /// # Errors
    /// `BucketNotFound` for buckets that never existed.
    pub fn bucket_status(&self, bucket_id: BucketId) -> Result<BucketStatus> {
        self.statuses
            .get(&bucket_id)
            .copied()
            .ok_or(GridclearError::BucketNotFound(bucket_id))
    }

    /// A bid by bucket and insertion index. Cleared buckets' books are
    /// purged, so their offers are no longer readable.
    ///
    /// # Errors
    /// `BucketNotFound` if the book is gone, `OfferNotFound` past the end.
    pub fn bid(&self, bucket_id: BucketId, index: u64) -> Result<Offer> {
        self.book(bucket_id)?
            .bid(index)
            .copied()
            .ok_or(GridclearError::OfferNotFound {
                bucket_id,
                side: Side::Bid,
                index,
            })
    }

    /// An ask by bucket and insertion index.
    ///
    /// # Errors
    /// `BucketNotFound` if the book is gone, `OfferNotFound` past the end.
    pub fn ask(&self, bucket_id: BucketId, index: u64) -> Result<Offer> {
        self.book(bucket_id)?
            .ask(index)
            .copied()
            .ok_or(GridclearError::OfferNotFound {
                bucket_id,
                side: Side::Ask,
                index,
            })
    }

    /// Match results for a rolled bucket.
    ///
    /// # Errors
    /// `TradeBucketNotFound` if the bucket has not been rolled.
    pub fn trade_bucket(&self, bucket_id: BucketId) -> Result<&TradeBucket> {
        self.trade_buckets
            .get(&bucket_id)
            .ok_or(GridclearError::TradeBucketNotFound(bucket_id))
    }

    /// The most recently rolled bucket's results.
    ///
    /// # Errors
    /// `TradeBucketNotFound` before the first roll.
    pub fn last_trade_bucket(&self) -> Result<&TradeBucket> {
        let prev = self
            .current_bucket_id
            .prev()
            .ok_or(GridclearError::TradeBucketNotFound(self.current_bucket_id))?;
        self.trade_bucket(prev)
    }

    /// # Errors
    /// `TradeBucketNotFound` before the first roll.
    pub fn last_trade_bucket_trade_count(&self) -> Result<u64> {
        Ok(self.last_trade_bucket()?.trade_count())
    }

    /// # Errors
    /// `TradeBucketNotFound` before the first roll.
    pub fn last_trade_bucket_clearing_price(&self) -> Result<u64> {
        Ok(self.last_trade_bucket()?.clearing_price)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn book(&self, bucket_id: BucketId) -> Result<&BucketBook> {
        self.books
            .get(&bucket_id)
            .ok_or(GridclearError::BucketNotFound(bucket_id))
    }

    fn open_book(&self) -> Result<&BucketBook> {
        let id = self.current_bucket_id;
        self.books
            .get(&id)
            .ok_or_else(|| GridclearError::Internal(format!("open {id} has no book")))
    }

    fn open_book_mut(&mut self) -> Result<&mut BucketBook> {
        let id = self.current_bucket_id;
        self.books
            .get_mut(&id)
            .ok_or_else(|| GridclearError::Internal(format!("open {id} has no book")))
    }

    /// Held escrow must equal open-bucket escrows plus the unsupplied
    /// obligations of the last rolled bucket.
    fn verify_conservation(&self) -> Result<()> {
        let open_bids = self.open_book()?.bids();
        let last = self
            .current_bucket_id
            .prev()
            .and_then(|prev| self.trade_buckets.get(&prev));
        let expected = conservation::expected_held(open_bids, last)?;
        conservation::verify(self.ledger.held(), expected)
    }
}

#[cfg(test)]
mod tests {
    use gridclear_types::MemorySink;

    use crate::clock::ManualClock;
    use crate::escrow::InMemoryVault;

    use super::*;

    fn setup(duration: u64) -> (AuctionEngine, TraderId, ManualClock, MemorySink) {
        let owner = TraderId::new();
        let clock = ManualClock::new(0);
        let sink = MemorySink::new();
        let engine = AuctionEngine::new(
            owner,
            EngineConfig::with_duration(duration),
            Box::new(InMemoryVault::new()),
            Box::new(clock.clone()),
            Box::new(sink.clone()),
        );
        (engine, owner, clock, sink)
    }

    #[test]
    fn construction_opens_bucket_zero_and_announces_owner() {
        let (engine, owner, _, sink) = setup(900);
        assert_eq!(engine.current_bucket_id(), BucketId(0));
        assert_eq!(engine.owner(), owner);
        assert_eq!(
            engine.bucket_status(BucketId(0)).unwrap(),
            BucketStatus::Open
        );
        assert_eq!(
            sink.snapshot(),
            vec![EngineEvent::OwnerAnnounce { owner }]
        );
    }

    #[test]
    fn non_owner_roll_rejected() {
        let (mut engine, _, clock, _) = setup(900);
        clock.advance(900);
        let err = engine.roll(TraderId::new()).unwrap_err();
        assert!(matches!(err, GridclearError::Unauthorized { .. }));
        assert_eq!(engine.current_bucket_id(), BucketId(0));
    }

    #[test]
    fn early_roll_rejected() {
        let (mut engine, owner, clock, _) = setup(900);
        clock.advance(899);
        let err = engine.roll(owner).unwrap_err();
        match err {
            GridclearError::TooEarly { elapsed, required } => {
                assert_eq!(elapsed, 899);
                assert_eq!(required, 900);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn roll_at_exact_duration_succeeds() {
        let (mut engine, owner, clock, _) = setup(900);
        clock.advance(900);
        engine.roll(owner).unwrap();
        assert_eq!(engine.current_bucket_id(), BucketId(1));
        assert_eq!(
            engine.bucket_status(BucketId(0)).unwrap(),
            BucketStatus::Closed
        );
        assert_eq!(
            engine.bucket_status(BucketId(1)).unwrap(),
            BucketStatus::Open
        );
    }

    #[test]
    fn submit_bid_escrows_value() {
        let (mut engine, _, _, _) = setup(900);
        let trader = TraderId::new();
        let offer_id = engine.submit_bid(trader, 2, 3, 6).unwrap();
        assert_eq!(offer_id, 0);
        assert_eq!(engine.escrow_held(), 6);
        assert_eq!(engine.bid(BucketId(0), 0).unwrap().trader, trader);
    }

    #[test]
    fn invalid_bid_changes_nothing() {
        let (mut engine, _, _, sink) = setup(900);
        let before = sink.len();
        let err = engine.submit_bid(TraderId::new(), 2, 3, 5).unwrap_err();
        assert!(matches!(err, GridclearError::InvalidOrder { .. }));
        assert_eq!(engine.escrow_held(), 0);
        assert_eq!(sink.len(), before);
        assert!(engine.bid(BucketId(0), 0).is_err());
    }

    #[test]
    fn offer_ids_are_per_side() {
        let (mut engine, _, _, _) = setup(900);
        let t = TraderId::new();
        assert_eq!(engine.submit_bid(t, 1, 1, 1).unwrap(), 0);
        assert_eq!(engine.submit_ask(t, 1, 1).unwrap(), 0);
        assert_eq!(engine.submit_ask(t, 1, 2).unwrap(), 1);
    }

    #[test]
    fn reads_outside_domain_fail() {
        let (engine, _, _, _) = setup(900);
        assert!(matches!(
            engine.bucket_status(BucketId(5)),
            Err(GridclearError::BucketNotFound(_))
        ));
        assert!(matches!(
            engine.trade_bucket(BucketId(0)),
            Err(GridclearError::TradeBucketNotFound(_))
        ));
        assert!(matches!(
            engine.last_trade_bucket(),
            Err(GridclearError::TradeBucketNotFound(_))
        ));
        assert!(matches!(
            engine.ask(BucketId(0), 0),
            Err(GridclearError::OfferNotFound { .. })
        ));
    }

    #[test]
    fn mark_delivered_on_open_bucket_is_lookup_error() {
        let (mut engine, _, _, _) = setup(900);
        let err = engine
            .mark_delivered(TraderId::new(), BucketId(0), 0)
            .unwrap_err();
        assert!(matches!(err, GridclearError::TradeBucketNotFound(_)));
    }
}
