//! Polling helpers for assertions about other threads.

use std::thread;
use std::time::{Duration, Instant};

/// Poll `condition` every millisecond until it holds or `timeout` passes.
///
/// Returns the final value of `condition`.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
