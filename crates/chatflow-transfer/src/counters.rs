//! Process-wide storage write counters.
//!
//! The fan-out writer increments these by batch length, not by one, from
//! many lane tasks concurrently, so they are plain atomics rather than a
//! lock-guarded pair. Monotonic for the life of the process; external
//! metrics scrape them and compute deltas.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct TransferCounters {
    success: AtomicU64,
    failure: AtomicU64,
}

impl TransferCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `n` events successfully written to the cache.
    pub fn record_success(&self, n: u64) {
        self.success.fetch_add(n, Ordering::Relaxed);
    }

    /// Records `n` events whose cache write failed.
    pub fn record_failure(&self, n: u64) {
        self.failure.fetch_add(n, Ordering::Relaxed);
    }

    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failure(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            success: self.success(),
            failure: self.failure(),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub success: u64,
    pub failure: u64,
}
