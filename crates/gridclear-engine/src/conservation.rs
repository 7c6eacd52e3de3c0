//! Escrow conservation checker.
//!
//! Invariant enforced after every roll and delivery:
//!
//! ```text
//! held == Σ open-bucket bid escrows
//!       + Σ unsupplied trades of the last rolled bucket × clearing price
//! ```
//!
//! Older buckets contribute nothing: their trades were paid on delivery
//! or disbursed at reconciliation. If this check ever fails, value has
//! been created or destroyed and the engine surfaces a critical error.

use gridclear_types::{checked_value, GridclearError, Offer, Result, TradeBucket};

/// Expected pooled escrow for the given engine state.
///
/// # Errors
/// `ArithmeticOverflow` if the obligation sum exceeds `u64`.
pub fn expected_held(open_bids: &[Offer], last_rolled: Option<&TradeBucket>) -> Result<u64> {
    let mut expected: u64 = 0;
    for bid in open_bids {
        expected = add(expected, bid.notional()?)?;
    }
    if let Some(tb) = last_rolled {
        for (_, trade) in tb.unsupplied() {
            expected = add(expected, checked_value(trade.energy_amount, tb.clearing_price)?)?;
        }
    }
    Ok(expected)
}

/// Compare actual held escrow against the expected total.
///
/// # Errors
/// `EscrowInvariant` when they differ.
pub fn verify(held: u64, expected: u64) -> Result<()> {
    if held != expected {
        return Err(GridclearError::EscrowInvariant {
            reason: format!("held escrow {held} != outstanding obligations {expected}"),
        });
    }
    Ok(())
}

fn add(total: u64, amount: u64) -> Result<u64> {
    total
        .checked_add(amount)
        .ok_or(GridclearError::ArithmeticOverflow {
            context: "obligation sum",
        })
}
