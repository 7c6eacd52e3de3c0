//! # gridclear-engine
//!
//! The stateful plane of the **gridclear** periodic double auction:
//!
//! - [`AuctionEngine`]: bucket lifecycle, order intake, the operator
//!   `roll`, and seller delivery settlement
//! - [`EscrowLedger`] over a [`ValueTransfer`] capability, with
//!   [`InMemoryVault`] as the in-process substrate
//! - [`Clock`] with [`SystemClock`] and the [`ManualClock`] test double
//! - [`conservation`]: the held-escrow invariant checker
//!
//! ## Bucket Lifecycle
//!
//! ```text
//! ┌──────────┐ roll ┌──────────┐ next roll ┌──────────┐
//! │   OPEN   │─────▶│  CLOSED  │──────────▶│ CLEARED  │
//! │ collect  │      │ matched, │           │ expired  │
//! │ offers   │      │ deliver  │           │ trades   │
//! └──────────┘      └──────────┘           │ paid out │
//!                                          └──────────┘
//! ```
//!
//! Exactly one bucket is OPEN at any time. Every roll closes it, matches
//! it at a uniform clearing price, refunds rejected and overpaying
//! bidders, reconciles the previous bucket's unsupplied trades, and
//! opens the next bucket — atomically from the outside.

pub mod clock;
pub mod conservation;
pub mod engine;
pub mod escrow;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::AuctionEngine;
pub use escrow::{EscrowLedger, InMemoryVault, TransferError, ValueTransfer};
