//! Stall events and the sinks that receive them.

use std::fmt;
use std::time::Duration;

/// A responsiveness problem observed by the monitor.
///
/// `Busy` and `Delayed` are independent: a single slow cycle usually emits
/// `Busy` first and `Delayed` once the ping finally runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallEvent {
    /// The ping had not executed after one full threshold window.
    Busy,
    /// The ping executed, but later than the threshold.
    Delayed {
        /// Time from submission to execution on the main context.
        latency: Duration,
    },
}

impl StallEvent {
    /// Latency in fractional milliseconds, if this event carries one.
    #[must_use]
    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            Self::Busy => None,
            Self::Delayed { latency } => Some(latency.as_secs_f64() * 1000.0),
        }
    }

    /// Whether this is a `Busy` event.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// Whether this is a `Delayed` event.
    #[must_use]
    pub fn is_delayed(&self) -> bool {
        matches!(self, Self::Delayed { .. })
    }
}

impl fmt::Display for StallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "main thread busy"),
            Self::Delayed { latency } => write!(
                f,
                "main thread delayed: {:.2} ms",
                latency.as_secs_f64() * 1000.0
            ),
        }
    }
}

/// Receives stall events from the monitor thread.
///
/// Called on the monitor thread; implementations should return quickly
/// since the time spent here delays the next cycle.
pub trait StallReporter: Send + Sync + 'static {
    /// Handle one event.
    fn report(&self, event: &StallEvent);
}

impl<F> StallReporter for F
where
    F: Fn(&StallEvent) + Send + Sync + 'static,
{
    fn report(&self, event: &StallEvent) {
        self(event);
    }
}

/// Default reporter: logs each event through `tracing` at WARN.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl StallReporter for TracingReporter {
    fn report(&self, event: &StallEvent) {
        match event {
            StallEvent::Busy => {
                tracing::warn!(target: "mainthread_watchdog", "{event}");
            }
            StallEvent::Delayed { latency } => {
                tracing::warn!(
                    target: "mainthread_watchdog",
                    latency_ms = latency.as_secs_f64() * 1000.0,
                    "{event}"
                );
            }
        }
    }
}
