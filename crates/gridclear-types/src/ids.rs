//! Identifiers used throughout gridclear.
//!
//! Participants are opaque UUIDv7 handles; buckets are dense monotonic
//! ordinals starting at 0. Trade ids are plain ordinals within their
//! bucket and carry no newtype.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TraderId
// ---------------------------------------------------------------------------

/// Opaque participant identity. Uses UUIDv7 for time-ordered sorting.
///
/// The engine never authenticates traders — identity arrives with each
/// call from whatever substrate hosts the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TraderId(pub Uuid);

impl TraderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Shortened form for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TraderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trader:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BucketId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier for an order-collection bucket.
///
/// Bucket 0 is created at engine construction; every roll opens the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BucketId(pub u64);

impl BucketId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The preceding bucket, or `None` for bucket 0.
    #[must_use]
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bucket:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trader_id_uniqueness() {
        let a = TraderId::new();
        let b = TraderId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn trader_id_short_is_prefix() {
        let id = TraderId::new();
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(id.0.simple().to_string().starts_with(&short));
    }

    #[test]
    fn bucket_id_next_and_prev() {
        assert_eq!(BucketId(0).next(), BucketId(1));
        assert_eq!(BucketId(7).prev(), Some(BucketId(6)));
        assert_eq!(BucketId(0).prev(), None);
    }

    #[test]
    fn bucket_id_display() {
        assert_eq!(format!("{}", BucketId(42)), "bucket:42");
    }

    #[test]
    fn serde_roundtrips() {
        let tid = TraderId::new();
        let json = serde_json::to_string(&tid).unwrap();
        let back: TraderId = serde_json::from_str(&json).unwrap();
        assert_eq!(tid, back);

        let bid = BucketId(3);
        let json = serde_json::to_string(&bid).unwrap();
        let back: BucketId = serde_json::from_str(&json).unwrap();
        assert_eq!(bid, back);
    }
}
