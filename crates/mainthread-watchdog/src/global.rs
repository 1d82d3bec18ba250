//! Process-wide default watchdog.
//!
//! A convenience for hosts that want a single watchdog reachable from
//! anywhere, e.g. from application launch and shutdown hooks. The instance
//! is installed explicitly; nothing is created implicitly.

use parking_lot::Mutex;
use std::sync::OnceLock;

use crate::error::{WatchdogError, WatchdogResult};
use crate::stats::HeartbeatStats;
use crate::watchdog::Watchdog;

static GLOBAL: OnceLock<Mutex<Option<Watchdog>>> = OnceLock::new();

fn slot() -> &'static Mutex<Option<Watchdog>> {
    GLOBAL.get_or_init(|| Mutex::new(None))
}

/// Install `watchdog` as the process-wide instance.
///
/// Returns the previously installed instance, which the caller may shut
/// down or drop.
pub fn install(watchdog: Watchdog) -> Option<Watchdog> {
    slot().lock().replace(watchdog)
}

/// Remove and return the process-wide instance.
pub fn uninstall() -> Option<Watchdog> {
    slot().lock().take()
}

/// Start the process-wide instance.
///
/// A monitor being replaced is torn down after the instance lock is
/// released, so other callers are not blocked while it is joined.
///
/// # Errors
///
/// Returns [`WatchdogError::NotInstalled`] if nothing was installed, or any
/// error from [`Watchdog::start`].
pub fn start() -> WatchdogResult<()> {
    let replaced = match slot().lock().as_mut() {
        Some(watchdog) => watchdog.replace_monitor()?,
        None => return Err(WatchdogError::NotInstalled),
    };
    drop(replaced);
    Ok(())
}

/// Stop the process-wide instance, if any.
pub fn stop() {
    if let Some(watchdog) = slot().lock().as_ref() {
        watchdog.stop();
    }
}

/// Whether the process-wide instance is installed and running.
#[must_use]
pub fn is_running() -> bool {
    slot().lock().as_ref().is_some_and(Watchdog::is_running)
}

/// Statistics of the process-wide instance, if installed.
#[must_use]
pub fn stats() -> Option<HeartbeatStats> {
    slot().lock().as_ref().map(Watchdog::stats)
}
