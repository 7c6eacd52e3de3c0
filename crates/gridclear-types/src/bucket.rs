//! Bucket lifecycle states.
//!
//! Each bucket moves through **OPEN → CLOSED → CLEARED** and never back:
//! OPEN while collecting offers, CLOSED once rolled and matched, CLEARED
//! once the *next* roll has reconciled its unsupplied trades.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three non-overlapping states of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketStatus {
    /// Accepting offers; exactly one bucket is OPEN at any time.
    Open,
    /// Rolled and matched; its trades await delivery or expiry.
    Closed,
    /// Reconciled by a subsequent roll; offer lists purged.
    Cleared,
}

impl fmt::Display for BucketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Cleared => write!(f, "CLEARED"),
        }
    }
}

impl BucketStatus {
    /// Whether `next` is a legal successor state.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Closed) | (Self::Closed, Self::Cleared)
        )
    }
}
