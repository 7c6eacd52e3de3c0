//! Observable outcomes of the gridclear engine.
//!
//! The engine pushes structured [`EngineEvent`] records to an
//! [`EventSink`] as they occur. Within a roll the order is fixed:
//! expiry records first, then rejected bids in sorted-bid order, then
//! rejected asks in sorted-ask order, then matched trades in commitment
//! order. [`MemorySink`] appends to a shared in-memory log; networked
//! substrates serialise instead.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::{BucketId, Side, TraderId};

/// Why an offer went unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// A bid that could not be filled completely at its price.
    UnmeetableDemand,
    /// An ask (or part of one) no bid absorbed.
    UndemandedSupply,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmeetableDemand => write!(f, "unmeetable demand at bid price"),
            Self::UndemandedSupply => write!(f, "undemanded supply at ask price"),
        }
    }
}

/// One observable engine outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Emitted once at construction.
    OwnerAnnounce { owner: TraderId },
    /// An offer was accepted into the open bucket.
    TradeReceived {
        trader: TraderId,
        bucket_id: BucketId,
        side: Side,
        offer_id: u64,
        energy: u64,
        price: u64,
    },
    /// An unsupplied trade was reconciled at the following roll.
    TradeExpired {
        buyer: TraderId,
        seller: TraderId,
        bucket_id: BucketId,
        trade_id: u64,
        refund: u64,
    },
    /// A trade was confirmed during matching.
    TradeMatched {
        buyer: TraderId,
        seller: TraderId,
        bucket_id: BucketId,
        trade_id: u64,
        energy: u64,
        clearing_price: u64,
        supplied: bool,
    },
    /// An offer went unmatched; bids get their escrow back.
    TradeRejected {
        trader: TraderId,
        bucket_id: BucketId,
        side: Side,
        offer_id: u64,
        refund: u64,
        reason: RejectReason,
    },
    /// A seller marked delivery and was paid.
    EnergySupplied {
        seller: TraderId,
        buyer: TraderId,
        bucket_id: BucketId,
        trade_id: u64,
        energy: u64,
        payment: u64,
    },
}

/// Consumer of engine events.
///
/// The engine owns a boxed sink and pushes every record exactly once, in
/// emission order.
pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);
}

/// Append-only in-memory event log.
///
/// Clones share the same underlying log, so a test can hand one clone to
/// the engine and keep another to inspect.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event emitted so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EngineEvent> {
        self.events.lock().expect("event log poisoned").clone()
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().expect("event log poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: EngineEvent) {
        self.events.lock().expect("event log poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_reason_display() {
        assert_eq!(
            format!("{}", RejectReason::UnmeetableDemand),
            "unmeetable demand at bid price"
        );
        assert_eq!(
            format!("{}", RejectReason::UndemandedSupply),
            "undemanded supply at ask price"
        );
    }

    #[test]
    fn memory_sink_clones_share_log() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.emit(EngineEvent::OwnerAnnounce {
            owner: TraderId::new(),
        });
        assert_eq!(sink.len(), 1);
        assert!(matches!(
            sink.snapshot()[0],
            EngineEvent::OwnerAnnounce { .. }
        ));
    }

    #[test]
    fn memory_sink_preserves_order() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        let trader = TraderId::new();
        writer.emit(EngineEvent::TradeReceived {
            trader,
            bucket_id: BucketId(0),
            side: Side::Bid,
            offer_id: 0,
            energy: 1,
            price: 1,
        });
        writer.emit(EngineEvent::TradeReceived {
            trader,
            bucket_id: BucketId(0),
            side: Side::Ask,
            offer_id: 0,
            energy: 1,
            price: 1,
        });
        let log = sink.snapshot();
        assert!(matches!(
            log[0],
            EngineEvent::TradeReceived { side: Side::Bid, .. }
        ));
        assert!(matches!(
            log[1],
            EngineEvent::TradeReceived { side: Side::Ask, .. }
        ));
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = EngineEvent::TradeMatched {
            buyer: TraderId::new(),
            seller: TraderId::new(),
            bucket_id: BucketId(3),
            trade_id: 0,
            energy: 2,
            clearing_price: 5,
            supplied: false,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: EngineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
