//! The heartbeat loop.
//!
//! A [`Monitor`] owns one dedicated thread that repeats the ping cycle until
//! it is canceled:
//!
//! 1. stop if cancellation was requested;
//! 2. mark a ping outstanding, note the submission instant, submit the ping;
//! 3. sleep one threshold window, then emit [`StallEvent::Busy`] if the ping
//!    has not run yet;
//! 4. wait for the ping's release;
//! 5. emit [`StallEvent::Delayed`] if submission-to-execution exceeded the
//!    threshold.
//!
//! Cancellation is cooperative. It is never observed during the sleep, and
//! under [`WaitPolicy::Unbounded`] it is not observed during the wait
//! either: if the main context never runs the ping, the thread stays parked
//! until the process exits.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::channel::HeartbeatChannel;
use crate::config::{WaitPolicy, WatchdogConfig};
use crate::error::{WatchdogError, WatchdogResult};
use crate::event::{StallEvent, StallReporter};
use crate::main_context::MainContext;
use crate::signal::SignalCounters;
use crate::stats::HeartbeatStats;

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a monitor. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MonitorState {
    /// Created, thread not started.
    Idle = 0,
    /// Heartbeat loop running.
    Running = 1,
    /// Cancellation requested. Terminal.
    Canceled = 2,
}

impl MonitorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Canceled,
        }
    }
}

/// State shared between the [`Monitor`] handle and its thread.
struct MonitorShared {
    config: WatchdogConfig,
    channel: Arc<HeartbeatChannel>,
    state: AtomicU8,
    stats: Mutex<HeartbeatStats>,
    context: Arc<dyn MainContext>,
    reporter: Arc<dyn StallReporter>,
}

impl MonitorShared {
    fn state(&self) -> MonitorState {
        MonitorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn is_canceled(&self) -> bool {
        self.state() == MonitorState::Canceled
    }

    fn run(&self) {
        tracing::info!(
            threshold_ms = self.config.threshold_ms(),
            wait_policy = ?self.config.wait_policy,
            "Main thread watchdog started"
        );

        let mut cycle: u64 = 0;
        while !self.is_canceled() {
            cycle = cycle.saturating_add(1);
            if !self.run_cycle(cycle) {
                break;
            }
        }

        tracing::info!(cycles = cycle, "Main thread watchdog stopped");
    }

    /// One ping/measure/report cycle. Returns `false` if the monitor was
    /// canceled while waiting for the ping.
    fn run_cycle(&self, cycle: u64) -> bool {
        let threshold = self.config.threshold;

        self.channel.mark_outstanding();
        let submitted_at = Instant::now();
        let channel: Weak<HeartbeatChannel> = Arc::downgrade(&self.channel);
        self.context.submit(Box::new(move || {
            if let Some(channel) = channel.upgrade() {
                channel.clear_and_signal();
            }
        }));
        self.stats.lock().record_submission();

        thread::sleep(threshold);

        if self.channel.is_outstanding() {
            self.stats.lock().record_busy();
            self.emit(&StallEvent::Busy, cycle);
        }

        if !self.await_ping(cycle) {
            return false;
        }

        let latency = self
            .channel
            .answered_at()
            .saturating_duration_since(submitted_at);
        let delayed = latency > threshold;
        self.stats.lock().record_round_trip(latency, delayed);
        if delayed {
            self.emit(&StallEvent::Delayed { latency }, cycle);
        }

        true
    }

    fn await_ping(&self, cycle: u64) -> bool {
        match self.config.wait_policy {
            WaitPolicy::Unbounded => {
                self.channel.await_signal();
                true
            }
            WaitPolicy::Cancelable { poll_interval } => loop {
                if self.channel.await_signal_timeout(poll_interval) {
                    return true;
                }
                if self.is_canceled() {
                    tracing::debug!(cycle, "Canceled while waiting for ping");
                    return false;
                }
            },
        }
    }

    fn emit(&self, event: &StallEvent, cycle: u64) {
        tracing::trace!(cycle, event = %event, "Reporting stall");
        self.reporter.report(event);
    }
}

/// Handle to a heartbeat loop running on its own thread.
///
/// A monitor starts at most once. After [`cancel`](Self::cancel) it is
/// finished for good; create a new one to resume monitoring.
pub struct Monitor {
    shared: Arc<MonitorShared>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Create an idle monitor.
    #[must_use]
    pub fn new(
        config: WatchdogConfig,
        context: Arc<dyn MainContext>,
        reporter: Arc<dyn StallReporter>,
    ) -> Self {
        Self {
            shared: Arc::new(MonitorShared {
                config,
                channel: Arc::new(HeartbeatChannel::new()),
                state: AtomicU8::new(MonitorState::Idle as u8),
                stats: Mutex::new(HeartbeatStats::new()),
                context,
                reporter,
            }),
            handle: None,
        }
    }

    /// Spawn the heartbeat thread.
    ///
    /// Does nothing if the monitor is already running.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the monitor was
    /// already canceled, or the thread could not be spawned.
    pub fn start(&mut self) -> WatchdogResult<()> {
        self.shared.config.validate()?;

        match self.shared.state.compare_exchange(
            MonitorState::Idle as u8,
            MonitorState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(current) => {
                return match MonitorState::from_u8(current) {
                    MonitorState::Canceled => Err(WatchdogError::MonitorCanceled),
                    MonitorState::Idle | MonitorState::Running => Ok(()),
                };
            }
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.shared.config.thread_name.clone())
            .spawn(move || shared.run());

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared
                    .state
                    .store(MonitorState::Idle as u8, Ordering::Release);
                Err(WatchdogError::thread_spawn(e.to_string()))
            }
        }
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call performed the transition. Never blocks;
    /// the loop notices at its next check.
    pub fn cancel(&self) -> bool {
        let previous = self
            .shared
            .state
            .swap(MonitorState::Canceled as u8, Ordering::AcqRel);
        let transitioned = MonitorState::from_u8(previous) != MonitorState::Canceled;
        if transitioned {
            tracing::debug!("Main thread watchdog cancellation requested");
        }
        transitioned
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        self.shared.state()
    }

    /// Whether the heartbeat thread has been spawned and has not exited.
    #[must_use]
    pub fn is_thread_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Snapshot of the heartbeat statistics.
    #[must_use]
    pub fn stats(&self) -> HeartbeatStats {
        self.shared.stats.lock().clone()
    }

    /// Signal release/acquire totals for this monitor's channel.
    #[must_use]
    pub fn signal_counters(&self) -> SignalCounters {
        self.shared.channel.counters()
    }

    /// The configuration this monitor runs with.
    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.shared.config
    }

    /// Wait for the heartbeat thread to exit.
    ///
    /// Blocks until the loop observes cancellation; under
    /// [`WaitPolicy::Unbounded`] that requires any pending ping to execute.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::MonitorPanicked`] if the thread panicked.
    pub fn join(&mut self) -> WatchdogResult<()> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WatchdogError::MonitorPanicked),
            None => Ok(()),
        }
    }

    /// Wait up to `timeout` for the heartbeat thread to exit.
    ///
    /// Returns `Ok(true)` once the thread is joined and `Ok(false)` if it is
    /// still alive at the deadline, in which case the handle is kept.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::MonitorPanicked`] if the thread panicked.
    pub fn join_timeout(&mut self, timeout: Duration) -> WatchdogResult<bool> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.join().map(|()| true);
        };
        while self.is_thread_alive() {
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }
        self.join().map(|()| true)
    }

    /// Join the thread when that cannot block indefinitely, detach it
    /// otherwise.
    ///
    /// The join is bounded when the thread has already exited or the wait
    /// policy is [`WaitPolicy::Cancelable`]. Returns whether the thread was
    /// joined.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::MonitorPanicked`] if a joined thread panicked.
    pub fn join_or_detach(&mut self) -> WatchdogResult<bool> {
        if self.shared.config.wait_policy.is_bounded() || !self.is_thread_alive() {
            self.join().map(|()| true)
        } else {
            self.detach();
            Ok(false)
        }
    }

    /// Drop the thread handle without waiting.
    pub fn detach(&mut self) {
        if self.handle.take().is_some() {
            tracing::debug!("Main thread watchdog monitor detached");
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.cancel();
        if let Err(e) = self.join_or_detach() {
            tracing::error!(error = %e, "Main thread watchdog did not shut down cleanly");
        }
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .field("thread_alive", &self.is_thread_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_context::{Task, main_queue};
    use std::time::Duration;

    fn quiet() -> Arc<dyn StallReporter> {
        Arc::new(|_: &StallEvent| {})
    }

    #[test]
    fn test_new_monitor_is_idle() {
        let (queue, _main_loop) = main_queue();
        let monitor = Monitor::new(WatchdogConfig::default(), Arc::new(queue), quiet());
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert!(!monitor.is_thread_alive());
        assert_eq!(monitor.stats(), HeartbeatStats::default());
    }

    #[test]
    fn test_start_rejects_zero_threshold() {
        let (queue, _main_loop) = main_queue();
        let mut monitor = Monitor::new(
            WatchdogConfig::with_threshold(Duration::ZERO),
            Arc::new(queue),
            quiet(),
        );
        assert!(matches!(
            monitor.start(),
            Err(WatchdogError::InvalidConfiguration(_))
        ));
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[test]
    fn test_canceled_monitor_cannot_restart() {
        let (queue, _main_loop) = main_queue();
        let mut monitor = Monitor::new(WatchdogConfig::default(), Arc::new(queue), quiet());
        assert!(monitor.cancel());
        assert!(!monitor.cancel());
        assert_eq!(monitor.start(), Err(WatchdogError::MonitorCanceled));
    }

    #[test]
    fn test_cycle_pairs_signal_with_wait() -> WatchdogResult<()> {
        let (queue, main_loop) = main_queue();
        let config = WatchdogConfig::builder()
            .threshold_ms(5)
            .wait_policy(WaitPolicy::Cancelable {
                poll_interval: Duration::from_millis(5),
            })
            .build()?;
        let mut monitor = Monitor::new(config, Arc::new(queue), quiet());
        monitor.start()?;

        let deadline = Instant::now() + Duration::from_secs(5);
        while monitor.stats().cycles_completed < 3 && Instant::now() < deadline {
            main_loop.run_next(Duration::from_millis(5));
        }

        monitor.cancel();
        while monitor.is_thread_alive() && Instant::now() < deadline {
            main_loop.run_next(Duration::from_millis(5));
        }
        monitor.join()?;

        let stats = monitor.stats();
        let counters = monitor.signal_counters();
        assert!(stats.cycles_completed >= 3);
        assert_eq!(counters.acquired, stats.cycles_completed);
        assert!(counters.released >= counters.acquired);
        assert!(counters.outstanding() <= 1);
        Ok(())
    }

    #[test]
    fn test_join_or_detach_leaves_parked_unbounded_monitor() -> WatchdogResult<()> {
        let (queue, main_loop) = main_queue();
        let config = WatchdogConfig::builder().threshold_ms(2).build()?;
        let mut monitor = Monitor::new(config, Arc::new(queue), quiet());
        monitor.start()?;

        let deadline = Instant::now() + Duration::from_secs(5);
        while main_loop.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        monitor.cancel();
        thread::sleep(Duration::from_millis(10));

        assert_eq!(monitor.join_timeout(Duration::from_millis(20)), Ok(false));
        assert!(monitor.is_thread_alive());
        assert_eq!(monitor.join_or_detach(), Ok(false));
        assert!(!monitor.is_thread_alive());

        // The detached thread exits once its ping runs.
        assert_eq!(main_loop.run_pending(), 1);
        Ok(())
    }

    #[test]
    fn test_join_timeout_joins_exited_thread() -> WatchdogResult<()> {
        let (queue, main_loop) = main_queue();
        let config = WatchdogConfig::builder().threshold_ms(2).build()?;
        let mut monitor = Monitor::new(config, Arc::new(queue), quiet());
        monitor.start()?;
        monitor.cancel();

        let deadline = Instant::now() + Duration::from_secs(5);
        while monitor.is_thread_alive() && Instant::now() < deadline {
            main_loop.run_next(Duration::from_millis(5));
        }
        assert_eq!(monitor.join_timeout(Duration::from_secs(5)), Ok(true));
        assert_eq!(monitor.join_or_detach(), Ok(true));
        Ok(())
    }

    #[test]
    fn test_late_ping_after_drop_is_harmless() -> WatchdogResult<()> {
        let held: Arc<Mutex<Vec<Task>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&held);
        let context = move |task: Task| sink.lock().push(task);

        let config = WatchdogConfig::builder()
            .threshold_ms(2)
            .wait_policy(WaitPolicy::Cancelable {
                poll_interval: Duration::from_millis(2),
            })
            .build()?;
        let mut monitor = Monitor::new(config, Arc::new(context), quiet());
        monitor.start()?;

        let deadline = Instant::now() + Duration::from_secs(5);
        while held.lock().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        drop(monitor);

        for task in held.lock().drain(..) {
            task();
        }
        Ok(())
    }
}
