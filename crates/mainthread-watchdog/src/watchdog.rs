//! Watchdog supervisor.
//!
//! [`Watchdog`] is what a host holds on to. It owns the configuration, the
//! main-context handle and the reporter, and keeps at most one live
//! [`Monitor`] at a time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::WatchdogConfig;
use crate::error::WatchdogResult;
use crate::event::{StallReporter, TracingReporter};
use crate::main_context::MainContext;
use crate::monitor::{Monitor, MonitorState};
use crate::signal::SignalCounters;
use crate::stats::HeartbeatStats;

/// Main-thread responsiveness watchdog.
///
/// # Lifecycle
///
/// - [`start`](Self::start) validates the configuration and spawns a
///   monitor thread unless one is already running.
/// - [`stop`](Self::stop) requests cancellation and returns immediately.
///   Calling `start` afterwards spawns a fresh monitor.
/// - [`shutdown`](Self::shutdown) cancels, then joins or detaches the
///   thread by the same rule as drop.
/// - [`shutdown_timeout`](Self::shutdown_timeout) cancels and joins with a
///   deadline.
/// - Dropping the watchdog cancels the monitor. The thread is joined when
///   the wait policy bounds the join, and detached otherwise.
///
/// # Example
///
/// ```rust
/// use mainthread_watchdog::prelude::*;
/// use std::time::Duration;
///
/// let (queue, main_loop) = main_queue();
/// let config = WatchdogConfig::builder()
///     .threshold(Duration::from_millis(20))
///     .wait_policy(WaitPolicy::cancelable())
///     .build()?;
///
/// let mut watchdog = Watchdog::new(config, queue);
/// watchdog.start()?;
/// assert!(watchdog.is_running());
///
/// main_loop.run_next(Duration::from_millis(100));
/// watchdog.stop();
/// assert!(!watchdog.is_running());
/// # Ok::<(), WatchdogError>(())
/// ```
pub struct Watchdog {
    config: WatchdogConfig,
    context: Arc<dyn MainContext>,
    reporter: Arc<dyn StallReporter>,
    monitor: Option<Monitor>,
}

impl Watchdog {
    /// Create a watchdog that logs stalls through `tracing`.
    #[must_use]
    pub fn new(config: WatchdogConfig, context: impl MainContext) -> Self {
        Self::with_reporter(config, context, TracingReporter)
    }

    /// Create a watchdog that sends stalls to `reporter`.
    #[must_use]
    pub fn with_reporter(
        config: WatchdogConfig,
        context: impl MainContext,
        reporter: impl StallReporter,
    ) -> Self {
        Self {
            config,
            context: Arc::new(context),
            reporter: Arc::new(reporter),
            monitor: None,
        }
    }

    /// Start monitoring.
    ///
    /// A no-op while a monitor is already running. A monitor whose thread
    /// has died is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the monitor
    /// thread cannot be spawned.
    pub fn start(&mut self) -> WatchdogResult<()> {
        // Dropping the replaced monitor joins or detaches it.
        self.replace_monitor().map(drop)
    }

    /// Start a fresh monitor unless one is running, handing back the monitor
    /// it replaces so the caller decides where that one is dropped.
    pub(crate) fn replace_monitor(&mut self) -> WatchdogResult<Option<Monitor>> {
        self.config.validate()?;

        if self.is_running() {
            tracing::debug!("Main thread watchdog already running");
            return Ok(None);
        }
        if let Some(previous) = &self.monitor
            && previous.state() == MonitorState::Running
        {
            tracing::warn!("Main thread watchdog monitor exited unexpectedly, restarting");
        }

        let mut monitor = Monitor::new(
            self.config.clone(),
            Arc::clone(&self.context),
            Arc::clone(&self.reporter),
        );
        monitor.start()?;
        Ok(self.monitor.replace(monitor))
    }

    /// Request the monitor to stop. Does not wait for the thread.
    pub fn stop(&self) {
        if let Some(monitor) = &self.monitor {
            monitor.cancel();
        }
    }

    /// Cancel the monitor and tear it down.
    ///
    /// The thread is joined when the join is bounded: under
    /// [`WaitPolicy::Cancelable`](crate::WaitPolicy::Cancelable), or when it
    /// has already exited. A monitor parked on a pending ping under
    /// [`WaitPolicy::Unbounded`](crate::WaitPolicy::Unbounded) is detached,
    /// so calling this from the main context never deadlocks.
    ///
    /// # Errors
    ///
    /// Returns an error if a joined monitor thread panicked.
    pub fn shutdown(mut self) -> WatchdogResult<()> {
        match self.monitor.take() {
            Some(mut monitor) => {
                monitor.cancel();
                monitor.join_or_detach().map(drop)
            }
            None => Ok(()),
        }
    }

    /// Cancel the monitor and wait up to `timeout` for its thread to exit.
    ///
    /// Returns `Ok(true)` if the thread was joined and `Ok(false)` if it was
    /// detached at the deadline. Must not be called from the main context
    /// with an unbounded wait unless a detach is acceptable.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitor thread panicked.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> WatchdogResult<bool> {
        match self.monitor.take() {
            Some(mut monitor) => {
                monitor.cancel();
                let joined = monitor.join_timeout(timeout)?;
                if !joined {
                    monitor.detach();
                }
                Ok(joined)
            }
            None => Ok(true),
        }
    }

    /// Whether a monitor is running: started, not canceled, and its thread
    /// still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.monitor
            .as_ref()
            .is_some_and(|m| m.state() == MonitorState::Running && m.is_thread_alive())
    }

    /// Whether the most recent monitor's thread has exited (or never ran).
    #[must_use]
    pub fn has_exited(&self) -> bool {
        self.monitor.as_ref().is_none_or(|m| !m.is_thread_alive())
    }

    /// Statistics of the most recent monitor.
    #[must_use]
    pub fn stats(&self) -> HeartbeatStats {
        self.monitor
            .as_ref()
            .map(Monitor::stats)
            .unwrap_or_default()
    }

    /// Signal release/acquire totals of the most recent monitor.
    #[must_use]
    pub fn signal_counters(&self) -> SignalCounters {
        self.monitor
            .as_ref()
            .map(Monitor::signal_counters)
            .unwrap_or_default()
    }

    /// The watchdog configuration.
    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }
}

impl fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watchdog")
            .field("config", &self.config)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}
