//! Error types for the main-thread watchdog.
//!
//! Stalls are not errors: busy and delayed conditions are reported as
//! [`StallEvent`](crate::event::StallEvent)s. The variants here cover
//! configuration and lifecycle failures only.

use thiserror::Error;

/// Errors that can occur while configuring or driving a watchdog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchdogError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The monitor thread could not be spawned.
    #[error("Failed to spawn monitor thread: {0}")]
    ThreadSpawn(String),

    /// The monitor was canceled and cannot be started again.
    #[error("Monitor has been canceled and cannot be restarted")]
    MonitorCanceled,

    /// The monitor thread panicked before it could be joined.
    #[error("Monitor thread panicked")]
    MonitorPanicked,

    /// No process-wide watchdog has been installed.
    #[error("No process-wide watchdog installed")]
    NotInstalled,
}

impl WatchdogError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a thread spawn error.
    #[must_use]
    pub fn thread_spawn(reason: impl Into<String>) -> Self {
        Self::ThreadSpawn(reason.into())
    }
}

/// A specialized `Result` type for watchdog operations.
pub type WatchdogResult<T> = std::result::Result<T, WatchdogError>;
