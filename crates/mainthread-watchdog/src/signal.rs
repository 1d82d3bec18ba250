//! Counting signal shared between the monitor thread and the main context.
//!
//! A [`Semaphore`] starts with zero permits. [`Semaphore::release`] adds one
//! and wakes a waiter; [`Semaphore::acquire`] blocks until a permit is
//! available and consumes it. Release and acquire totals are tracked so the
//! one-release-per-acquire pairing can be checked from outside.

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Running totals of releases and acquisitions on a [`Semaphore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounters {
    /// Number of `release()` calls.
    pub released: u64,
    /// Number of permits consumed by any acquire variant.
    pub acquired: u64,
}

impl SignalCounters {
    /// Releases that have not been consumed yet.
    #[must_use]
    pub fn outstanding(&self) -> u64 {
        self.released.saturating_sub(self.acquired)
    }
}

/// Counting semaphore built on a `parking_lot` mutex and condition variable.
#[derive(Debug, Default)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
    released: AtomicU64,
    acquired: AtomicU64,
}

impl Semaphore {
    /// Create a semaphore holding `initial` permits.
    #[must_use]
    pub fn new(initial: usize) -> Self {
        Self {
            permits: Mutex::new(initial),
            available: Condvar::new(),
            released: AtomicU64::new(0),
            acquired: AtomicU64::new(0),
        }
    }

    /// Add one permit and wake a single waiter.
    pub fn release(&self) {
        {
            let mut permits = self.permits.lock();
            *permits = permits.saturating_add(1);
            self.released.fetch_add(1, Ordering::AcqRel);
        }
        self.available.notify_one();
    }

    /// Block until a permit is available, then consume it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits = permits.saturating_sub(1);
        self.acquired.fetch_add(1, Ordering::AcqRel);
    }

    /// Block for at most `timeout` waiting for a permit.
    ///
    /// Returns `true` if a permit was consumed.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.acquire();
            return true;
        };

        let mut permits = self.permits.lock();
        while *permits == 0 {
            if self
                .available
                .wait_until(&mut permits, deadline)
                .timed_out()
                && *permits == 0
            {
                return false;
            }
        }
        *permits = permits.saturating_sub(1);
        self.acquired.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Consume a permit if one is immediately available.
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits == 0 {
            return false;
        }
        *permits = permits.saturating_sub(1);
        self.acquired.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Permits currently available.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.permits.lock()
    }

    /// Snapshot of the release/acquire totals.
    #[must_use]
    pub fn counters(&self) -> SignalCounters {
        SignalCounters {
            released: self.released.load(Ordering::Acquire),
            acquired: self.acquired.load(Ordering::Acquire),
        }
    }
}
