//! Deterministic clock

use std::sync::atomic::{AtomicU64, Ordering};
use wmem_core::PhysicalClock;

/// Fixed: 2022-01-01 00:00:00 UTC
pub const DEFAULT_TIME_MS: u64 = 1_640_995_200_000;

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now_ms: AtomicU64,
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at(DEFAULT_TIME_MS)
    }
}

impl FixedClock {
    /// A clock reading `now_ms`
    pub fn at(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl PhysicalClock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
