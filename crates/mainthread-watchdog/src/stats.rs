//! Heartbeat statistics.
//!
//! Tracks what the monitor has observed so far: how many pings were sent,
//! how many round trips completed, how often each stall event fired, and
//! the latencies measured along the way.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Heartbeat statistics for one monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatStats {
    /// Pings submitted to the main context.
    pub pings_submitted: u64,
    /// Cycles whose ping executed and was measured.
    pub cycles_completed: u64,
    /// `Busy` events emitted.
    pub busy_events: u64,
    /// `Delayed` events emitted.
    pub delayed_events: u64,
    /// Latency of the most recent completed cycle in microseconds.
    pub last_latency_us: u64,
    /// Largest latency seen in microseconds.
    pub max_latency_us: u64,
    /// Sum of all measured latencies in microseconds.
    pub total_latency_us: u64,
}

impl HeartbeatStats {
    /// Create empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ping submission.
    pub fn record_submission(&mut self) {
        self.pings_submitted = self.pings_submitted.saturating_add(1);
    }

    /// Record a `Busy` event.
    pub fn record_busy(&mut self) {
        self.busy_events = self.busy_events.saturating_add(1);
    }

    /// Record a completed round trip.
    pub fn record_round_trip(&mut self, latency: Duration, delayed: bool) {
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.cycles_completed = self.cycles_completed.saturating_add(1);
        self.last_latency_us = latency_us;
        self.max_latency_us = self.max_latency_us.max(latency_us);
        self.total_latency_us = self.total_latency_us.saturating_add(latency_us);
        if delayed {
            self.delayed_events = self.delayed_events.saturating_add(1);
        }
    }

    /// Average latency in microseconds.
    ///
    /// Returns 0.0 if no cycle has completed.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "averages are reported as approximate floats"
    )]
    pub fn average_latency_us(&self) -> f64 {
        if self.cycles_completed == 0 {
            0.0
        } else {
            self.total_latency_us as f64 / self.cycles_completed as f64
        }
    }

    /// Percentage of completed cycles that were delayed.
    ///
    /// Returns 0.0 if no cycle has completed.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "rates are reported as approximate floats"
    )]
    pub fn delay_rate(&self) -> f64 {
        if self.cycles_completed == 0 {
            0.0
        } else {
            (self.delayed_events as f64 / self.cycles_completed as f64) * 100.0
        }
    }

    /// Pings submitted but not yet measured.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        self.pings_submitted.saturating_sub(self.cycles_completed)
    }
}
