//! Execution-id allocation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Allocates globally unique execution ids of the form
/// `exec-<device>-<nanos>`.
///
/// The nanosecond component is strictly increasing across calls: if two
/// allocations land on the same clock reading (or the clock steps backwards),
/// the later one is bumped past the earlier. Two dispatches with identical
/// inputs therefore always receive distinct ids.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_nanos: AtomicU64,
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id for `device`.
    pub fn allocate(&self, device: &str) -> String {
        let nanos = self.next_nanos(now_nanos());
        format!("exec-{device}-{nanos}")
    }

    fn next_nanos(&self, candidate: u64) -> u64 {
        let mut prev = self.last_nanos.load(Ordering::Relaxed);
        loop {
            let assigned = candidate.max(prev + 1);
            match self.last_nanos.compare_exchange_weak(
                prev,
                assigned,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return assigned,
                Err(observed) => prev = observed,
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)] // wraps in the year 2554
fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
