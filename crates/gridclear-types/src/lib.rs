//! # gridclear-types
//!
//! Shared types, errors, and configuration for the **gridclear** periodic
//! double-auction engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`TraderId`], [`BucketId`]
//! - **Offer model**: [`Offer`], [`Side`]
//! - **Trade model**: [`Trade`], [`TradeBucket`]
//! - **Bucket lifecycle**: [`BucketStatus`]
//! - **Events**: [`EngineEvent`], [`EventSink`], [`MemorySink`], [`RejectReason`]
//! - **Configuration**: [`EngineConfig`], [`ExpiryBeneficiary`]
//! - **Errors**: [`GridclearError`] with `GC_ERR_` prefix codes

pub mod bucket;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod offer;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use gridclear_types::{Offer, Side, Trade, TradeBucket, ...};

pub use bucket::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use offer::*;
pub use trade::*;

// Constants are accessed via `gridclear_types::constants::FOO`
// (not re-exported to avoid name collisions).
