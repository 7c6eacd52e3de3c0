//! Clock abstraction for the roll timing guard.
//!
//! The engine's only timing predicate is `now ≥ start_time + duration`.
//! It consumes whole seconds from whatever source the substrate provides;
//! [`SystemClock`] reads UNIX time at second resolution, [`ManualClock`]
//! advances only when told to (tests).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic second source.
pub trait Clock {
    /// Current time in whole seconds. Must never decrease.
    fn now(&self) -> u64;
}

/// Wall-clock seconds since the UNIX epoch, second resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // Pre-epoch wall clocks read as 0 rather than wrapping.
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Test clock that moves only on explicit advance.
///
/// Clones share the same underlying instant, so a test can hand one
/// clone to the engine and keep another to drive time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_where_told() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(0);
        clock.advance(900);
        assert_eq!(clock.now(), 900);
        clock.advance(1);
        assert_eq!(clock.now(), 901);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(0);
        let handle = clock.clone();
        handle.advance(42);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn system_clock_is_nonzero() {
        assert!(SystemClock.now() > 0);
    }
}
