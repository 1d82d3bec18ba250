//! Watchdog configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{WatchdogError, WatchdogResult};

/// Default response threshold: one frame at 60 Hz.
pub const DEFAULT_THRESHOLD: Duration = Duration::from_micros(16_600);

/// Default poll interval for [`WaitPolicy::Cancelable`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default name given to the monitor thread.
pub const DEFAULT_THREAD_NAME: &str = "main-thread-watchdog";

/// How the monitor waits for a submitted ping to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitPolicy {
    /// Block until the main context executes the ping, however long that
    /// takes. A main context that never drains its queue keeps the monitor
    /// thread parked until process exit, even after `stop()`.
    #[default]
    Unbounded,
    /// Wait in slices of `poll_interval`, checking for cancellation between
    /// slices. A canceled monitor exits without consuming the pending
    /// release.
    Cancelable {
        /// Upper bound on how long a cancellation can go unnoticed while
        /// waiting.
        poll_interval: Duration,
    },
}

impl WaitPolicy {
    /// Cancelable policy using [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn cancelable() -> Self {
        Self::Cancelable {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Whether a canceled monitor is guaranteed to exit in bounded time.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Cancelable { .. })
    }
}

/// Configuration for a [`Watchdog`](crate::Watchdog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Maximum acceptable main-context response latency.
    pub threshold: Duration,
    /// How the monitor waits for each ping.
    pub wait_policy: WaitPolicy,
    /// Name of the monitor thread.
    pub thread_name: String,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            wait_policy: WaitPolicy::Unbounded,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl WatchdogConfig {
    /// Default configuration with a custom threshold.
    #[must_use]
    pub fn with_threshold(threshold: Duration) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold or poll interval is zero, or if the
    /// thread name cannot be handed to the OS.
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.threshold.is_zero() {
            return Err(WatchdogError::invalid_configuration(
                "threshold must be greater than 0",
            ));
        }
        if let WaitPolicy::Cancelable { poll_interval } = self.wait_policy {
            if poll_interval.is_zero() {
                return Err(WatchdogError::invalid_configuration(
                    "poll_interval must be greater than 0",
                ));
            }
        }
        if self.thread_name.contains('\0') {
            return Err(WatchdogError::invalid_configuration(
                "thread_name must not contain NUL bytes",
            ));
        }
        Ok(())
    }

    /// Threshold in fractional milliseconds, for log fields.
    #[must_use]
    pub fn threshold_ms(&self) -> f64 {
        self.threshold.as_secs_f64() * 1000.0
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }
}

/// Builder for `WatchdogConfig`.
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the response threshold.
    #[must_use]
    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the response threshold in milliseconds.
    #[must_use]
    pub fn threshold_ms(mut self, ms: u64) -> Self {
        self.config.threshold = Duration::from_millis(ms);
        self
    }

    /// Set the wait policy.
    #[must_use]
    pub fn wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.config.wait_policy = policy;
        self
    }

    /// Set the monitor thread name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WatchdogResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
