//! System-wide constants for the gridclear auction engine.

/// Default bucket lifetime before it can be rolled, in seconds.
pub const DEFAULT_BUCKET_DURATION_SECS: u64 = 900;

/// Maximum offers accepted per bucket side.
pub const MAX_OFFERS_PER_SIDE: usize = 100_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "gridclear";
