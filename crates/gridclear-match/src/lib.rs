//! # gridclear-match
//!
//! The pure matching plane of the gridclear engine — no side effects,
//! no ledger access, no clock:
//!
//! - [`BucketBook`]: per-bucket insertion-ordered bid and ask lists
//! - [`sort_offers`]: stable, deterministic price ordering
//! - [`match_bucket`]: all-or-nothing uniform-price matching
//!
//! ## Determinism Contract
//!
//! Given the same bid and ask lists, [`match_bucket`] produces the same
//! trades, the same clearing price, and the same result digest. The only
//! sources of order are insertion order and the stable price sort.

pub mod book;
pub mod matcher;
pub mod sort;

pub use book::BucketBook;
pub use matcher::{match_bucket, AskOutcome, BidOutcome, MatchOutcome};
pub use sort::{sort_offers, Direction, SecondaryKey};
