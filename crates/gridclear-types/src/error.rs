//! Error types for the gridclear auction engine.
//!
//! All errors use the `GC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Authorization errors
//! - 3xx: Bucket lifecycle / lookup errors
//! - 4xx: Settlement errors
//! - 5xx: Ledger / invariant errors
//! - 9xx: General / internal errors
//!
//! Every variant's `Display` string is a stable discriminator: clients and
//! tests branch on the code prefix, never on free-text parsing.

use thiserror::Error;

use crate::{BucketId, Side};

/// Central error enum for all gridclear operations.
#[derive(Debug, Error)]
pub enum GridclearError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The offer failed validation (zero energy, zero price, or escrow
    /// value mismatch — each produces a distinct stable reason).
    #[error("GC_ERR_100: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// The bucket's order book side is at capacity.
    #[error("GC_ERR_101: Order book side full")]
    BookFull,

    // =================================================================
    // Authorization Errors (2xx)
    // =================================================================
    /// The caller is not entitled to the operation (non-owner roll,
    /// non-seller delivery mark).
    #[error("GC_ERR_200: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    // =================================================================
    // Bucket Lifecycle / Lookup Errors (3xx)
    // =================================================================
    /// `roll` invoked before the bucket lived its full duration.
    #[error("GC_ERR_300: Too early to roll: bucket open {elapsed}s of required {required}s")]
    TooEarly { elapsed: u64, required: u64 },

    /// No offer book for this bucket (never existed, or purged after clearing).
    #[error("GC_ERR_301: Bucket not found: {0}")]
    BucketNotFound(BucketId),

    /// Offer index out of range within an existing book.
    #[error("GC_ERR_302: Offer not found: {side} index {index} in {bucket_id}")]
    OfferNotFound {
        bucket_id: BucketId,
        side: Side,
        index: u64,
    },

    /// The bucket has not been rolled, so it has no trade results.
    #[error("GC_ERR_303: No trade bucket for {0}")]
    TradeBucketNotFound(BucketId),

    // =================================================================
    // Settlement Errors (4xx)
    // =================================================================
    /// `mark_delivered` with an out-of-range trade id.
    #[error("GC_ERR_400: Invalid trade: id {trade_id} out of range in {bucket_id}")]
    InvalidTrade { bucket_id: BucketId, trade_id: u64 },

    /// `mark_delivered` on a trade that was already supplied (idempotency guard).
    #[error("GC_ERR_401: Trade {trade_id} in {bucket_id} already supplied")]
    AlreadySupplied { bucket_id: BucketId, trade_id: u64 },

    /// `mark_delivered` after the trade's bucket was reconciled; the funds
    /// were already disbursed by expiry.
    #[error("GC_ERR_402: Delivery window closed for trade {trade_id} in {bucket_id}")]
    DeliveryWindowClosed { bucket_id: BucketId, trade_id: u64 },

    // =================================================================
    // Ledger / Invariant Errors (5xx)
    // =================================================================
    /// A transfer to a participant failed. Fatal to the containing
    /// operation: the engine rolls the whole operation back.
    #[error("GC_ERR_500: Ledger failure: {reason}")]
    LedgerFailure { reason: String },

    /// Escrowed value no longer equals the outstanding obligations —
    /// critical safety alert.
    #[error("GC_ERR_501: Escrow invariant violation: {reason}")]
    EscrowInvariant { reason: String },

    /// A monetary computation overflowed.
    #[error("GC_ERR_502: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error (broken engine invariant).
    #[error("GC_ERR_900: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GridclearError>;
