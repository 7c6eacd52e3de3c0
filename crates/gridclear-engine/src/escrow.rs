//! Escrow ledger — custodial accounting over a value-transfer capability.
//!
//! The ledger holds bidders' deposits in one pooled custodial account and
//! pays out along exactly four paths: rejection refund, overpayment
//! refund, seller payment on delivery, seller payment on expiry. Every
//! payout goes through the injected [`ValueTransfer`] capability; the
//! ledger itself only tracks the pooled total so the engine can verify
//! conservation.
//!
//! A failed transfer is fatal to the containing operation. Batch payouts
//! are all-or-nothing: the substrate's atomic primitive. Payouts are
//! push-based, which is acceptable because the ledger is custodial.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use gridclear_types::{GridclearError, Result, TraderId};
use thiserror::Error;

/// Failure from the value-transfer substrate.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// The substrate capability the engine consumes: move owned value to a
/// participant address.
pub trait ValueTransfer {
    /// Transfer `amount` to `to`.
    ///
    /// # Errors
    /// Any failure aborts the containing engine operation.
    fn transfer(&mut self, to: &TraderId, amount: u64) -> std::result::Result<(), TransferError>;

    /// Transfer every payout or none of them.
    ///
    /// Substrates back this with their atomic primitive (a reverted
    /// transaction on a chain, a serialised commit elsewhere).
    ///
    /// # Errors
    /// On failure no payout may have been applied.
    fn transfer_batch(
        &mut self,
        payouts: &[(TraderId, u64)],
    ) -> std::result::Result<(), TransferError>;
}

/// In-memory substrate: per-trader balances behind a shared handle.
///
/// Clones share the same balances, so a test can hand one clone to the
/// engine and keep another to inspect. `fail_transfers_to` injects a
/// failure mode for abort-path tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVault {
    balances: Arc<Mutex<HashMap<TraderId, u64>>>,
    failing: Arc<Mutex<HashSet<TraderId>>>,
}

impl InMemoryVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance credited to a trader so far.
    #[must_use]
    pub fn balance(&self, trader: &TraderId) -> u64 {
        self.balances
            .lock()
            .expect("vault poisoned")
            .get(trader)
            .copied()
            .unwrap_or(0)
    }

    /// Make every future transfer to `trader` fail.
    pub fn fail_transfers_to(&self, trader: TraderId) {
        self.failing.lock().expect("vault poisoned").insert(trader);
    }

    fn credit(
        balances: &mut HashMap<TraderId, u64>,
        to: &TraderId,
        amount: u64,
    ) -> std::result::Result<(), TransferError> {
        let entry = balances.entry(*to).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("balance overflow".into()))?;
        Ok(())
    }
}

impl ValueTransfer for InMemoryVault {
    fn transfer(&mut self, to: &TraderId, amount: u64) -> std::result::Result<(), TransferError> {
        if self.failing.lock().expect("vault poisoned").contains(to) {
            return Err(TransferError::Rejected(format!(
                "recipient {to} unavailable"
            )));
        }
        let mut balances = self.balances.lock().expect("vault poisoned");
        Self::credit(&mut balances, to, amount)
    }

    fn transfer_batch(
        &mut self,
        payouts: &[(TraderId, u64)],
    ) -> std::result::Result<(), TransferError> {
        let failing = self.failing.lock().expect("vault poisoned");
        if let Some((to, _)) = payouts.iter().find(|(to, _)| failing.contains(to)) {
            return Err(TransferError::Rejected(format!(
                "recipient {to} unavailable"
            )));
        }
        drop(failing);

        // All recipients accepted: apply under one lock so the batch is
        // atomic with respect to readers.
        let mut balances = self.balances.lock().expect("vault poisoned");
        let snapshot = balances.clone();
        for (to, amount) in payouts {
            if let Err(err) = Self::credit(&mut balances, to, *amount) {
                *balances = snapshot;
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Pooled-escrow accounting layer over a [`ValueTransfer`].
pub struct EscrowLedger {
    vault: Box<dyn ValueTransfer>,
    held: u64,
}

impl EscrowLedger {
    #[must_use]
    pub fn new(vault: Box<dyn ValueTransfer>) -> Self {
        Self { vault, held: 0 }
    }

    /// Receive escrowed value posted with a bid.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the pooled total would exceed `u64`.
    pub fn deposit(&mut self, amount: u64) -> Result<()> {
        self.held = self
            .held
            .checked_add(amount)
            .ok_or(GridclearError::ArithmeticOverflow {
                context: "escrow deposit",
            })?;
        Ok(())
    }

    /// Pay out a single entitlement. A zero amount is a no-op.
    ///
    /// # Errors
    /// - `EscrowInvariant` if the payout exceeds the pooled total
    /// - `LedgerFailure` if the substrate transfer fails (state unchanged)
    pub fn disburse(&mut self, to: &TraderId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.check_covered(amount)?;
        self.vault
            .transfer(to, amount)
            .map_err(|err| GridclearError::LedgerFailure {
                reason: err.to_string(),
            })?;
        self.held -= amount;
        Ok(())
    }

    /// Pay out a set of entitlements all-or-nothing. Zero amounts are
    /// skipped.
    ///
    /// # Errors
    /// - `EscrowInvariant` if the batch total exceeds the pooled total
    /// - `LedgerFailure` if the substrate rejects the batch (no payout
    ///   applied, pooled total unchanged)
    pub fn disburse_batch(&mut self, payouts: &[(TraderId, u64)]) -> Result<()> {
        let live: Vec<(TraderId, u64)> = payouts
            .iter()
            .copied()
            .filter(|&(_, amount)| amount > 0)
            .collect();
        if live.is_empty() {
            return Ok(());
        }

        let mut total: u64 = 0;
        for &(_, amount) in &live {
            total = total
                .checked_add(amount)
                .ok_or(GridclearError::ArithmeticOverflow {
                    context: "escrow batch total",
                })?;
        }
        self.check_covered(total)?;

        self.vault
            .transfer_batch(&live)
            .map_err(|err| GridclearError::LedgerFailure {
                reason: err.to_string(),
            })?;
        self.held -= total;
        Ok(())
    }

    /// Pooled escrow currently held.
    #[must_use]
    pub fn held(&self) -> u64 {
        self.held
    }

    fn check_covered(&self, amount: u64) -> Result<()> {
        if amount > self.held {
            return Err(GridclearError::EscrowInvariant {
                reason: format!("payout {amount} exceeds held escrow {}", self.held),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (EscrowLedger, InMemoryVault) {
        let vault = InMemoryVault::new();
        let ledger = EscrowLedger::new(Box::new(vault.clone()));
        (ledger, vault)
    }

    #[test]
    fn deposit_then_disburse() {
        let (mut ledger, vault) = setup();
        let trader = TraderId::new();
        ledger.deposit(100).unwrap();
        assert_eq!(ledger.held(), 100);

        ledger.disburse(&trader, 60).unwrap();
        assert_eq!(ledger.held(), 40);
        assert_eq!(vault.balance(&trader), 60);
    }

    #[test]
    fn zero_disburse_is_noop() {
        let (mut ledger, vault) = setup();
        let trader = TraderId::new();
        ledger.disburse(&trader, 0).unwrap();
        assert_eq!(vault.balance(&trader), 0);
    }

    #[test]
    fn overdraw_is_invariant_violation() {
        let (mut ledger, _) = setup();
        ledger.deposit(10).unwrap();
        let err = ledger.disburse(&TraderId::new(), 11).unwrap_err();
        assert!(matches!(err, GridclearError::EscrowInvariant { .. }));
        assert_eq!(ledger.held(), 10);
    }

    #[test]
    fn failed_transfer_leaves_held_unchanged() {
        let (mut ledger, vault) = setup();
        let trader = TraderId::new();
        vault.fail_transfers_to(trader);
        ledger.deposit(50).unwrap();

        let err = ledger.disburse(&trader, 50).unwrap_err();
        assert!(matches!(err, GridclearError::LedgerFailure { .. }));
        assert_eq!(ledger.held(), 50);
        assert_eq!(vault.balance(&trader), 0);
    }

    #[test]
    fn batch_pays_everyone() {
        let (mut ledger, vault) = setup();
        let a = TraderId::new();
        let b = TraderId::new();
        ledger.deposit(30).unwrap();

        ledger.disburse_batch(&[(a, 10), (b, 0), (b, 15)]).unwrap();
        assert_eq!(vault.balance(&a), 10);
        assert_eq!(vault.balance(&b), 15);
        assert_eq!(ledger.held(), 5);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let (mut ledger, vault) = setup();
        let good = TraderId::new();
        let bad = TraderId::new();
        vault.fail_transfers_to(bad);
        ledger.deposit(30).unwrap();

        let err = ledger.disburse_batch(&[(good, 10), (bad, 10)]).unwrap_err();
        assert!(matches!(err, GridclearError::LedgerFailure { .. }));
        assert_eq!(vault.balance(&good), 0, "no partial payout");
        assert_eq!(ledger.held(), 30);
    }

    #[test]
    fn batch_exceeding_held_rejected_before_transfer() {
        let (mut ledger, vault) = setup();
        let a = TraderId::new();
        ledger.deposit(5).unwrap();

        let err = ledger.disburse_batch(&[(a, 3), (a, 4)]).unwrap_err();
        assert!(matches!(err, GridclearError::EscrowInvariant { .. }));
        assert_eq!(vault.balance(&a), 0);
    }
}
