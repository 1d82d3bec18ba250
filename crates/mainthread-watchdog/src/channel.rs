//! Heartbeat channel: the state handed from the main context back to the
//! monitor thread.
//!
//! One channel belongs to one monitor. Each cycle the monitor calls
//! [`HeartbeatChannel::mark_outstanding`] before submitting a ping, the ping
//! calls [`HeartbeatChannel::clear_and_signal`] when the main context runs
//! it, and the monitor consumes that release with exactly one
//! [`HeartbeatChannel::await_signal`]. The channel is never reset between
//! cycles, so an unconsumed release would be picked up by the next cycle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::signal::{Semaphore, SignalCounters};

/// One-slot signal plus the shared `ping_outstanding` flag.
#[derive(Debug)]
pub struct HeartbeatChannel {
    outstanding: AtomicBool,
    epoch: Instant,
    /// Nanoseconds since `epoch` at which the last ping executed.
    answered_at_ns: AtomicU64,
    signal: Semaphore,
}

impl Default for HeartbeatChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartbeatChannel {
    /// Create a channel with no ping outstanding and no pending release.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outstanding: AtomicBool::new(false),
            epoch: Instant::now(),
            answered_at_ns: AtomicU64::new(0),
            signal: Semaphore::new(0),
        }
    }

    /// Flag a ping as submitted and not yet executed.
    pub fn mark_outstanding(&self) {
        self.outstanding.store(true, Ordering::Release);
    }

    /// Whether the last submitted ping is still waiting to execute.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Called from the main context when the ping executes.
    ///
    /// Records the execution instant, clears the flag, then releases the
    /// signal exactly once.
    pub fn clear_and_signal(&self) {
        let elapsed = self.epoch.elapsed();
        let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.answered_at_ns.store(ns, Ordering::Release);
        self.outstanding.store(false, Ordering::Release);
        self.signal.release();
    }

    /// Block until the main context has executed a ping, consuming its
    /// release. There is no timeout.
    pub fn await_signal(&self) {
        self.signal.acquire();
    }

    /// Like [`await_signal`](Self::await_signal) but gives up after
    /// `timeout`. Returns `true` if a release was consumed.
    pub fn await_signal_timeout(&self, timeout: Duration) -> bool {
        self.signal.acquire_timeout(timeout)
    }

    /// Instant at which the most recent ping executed on the main context.
    ///
    /// Only meaningful after a successful wait in the same cycle.
    #[must_use]
    pub fn answered_at(&self) -> Instant {
        let ns = self.answered_at_ns.load(Ordering::Acquire);
        self.epoch
            .checked_add(Duration::from_nanos(ns))
            .unwrap_or(self.epoch)
    }

    /// Releases produced by `clear_and_signal` and consumed by the waits.
    #[must_use]
    pub fn counters(&self) -> SignalCounters {
        self.signal.counters()
    }

    /// Releases not yet consumed.
    #[must_use]
    pub fn pending_signals(&self) -> usize {
        self.signal.available()
    }
}
