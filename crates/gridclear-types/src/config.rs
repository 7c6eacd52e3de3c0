//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Who receives a trade's funds when it expires unsupplied.
///
/// The reference behaviour pays the **seller** even though the buyer
/// never received energy — a seller-favouring policy (or latent bug)
/// preserved here as the default. Set `Buyer` to invert the direction.
/// The `TradeExpired` event is emitted identically under both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryBeneficiary {
    Seller,
    Buyer,
}

/// Configuration fixed at engine construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum lifetime of a bucket before it can be rolled, in seconds.
    pub bucket_duration_secs: u64,
    /// Payout direction for expired trades.
    pub expiry_beneficiary: ExpiryBeneficiary,
}

impl EngineConfig {
    /// Config with the given bucket duration and default policies.
    #[must_use]
    pub fn with_duration(bucket_duration_secs: u64) -> Self {
        Self {
            bucket_duration_secs,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bucket_duration_secs: constants::DEFAULT_BUCKET_DURATION_SECS,
            expiry_beneficiary: ExpiryBeneficiary::Seller,
        }
    }
}
