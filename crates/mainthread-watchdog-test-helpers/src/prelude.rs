//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use mainthread_watchdog_test_helpers::prelude::*;
//! ```

pub use crate::mock::{CountingContext, RecordingReporter, SimulatedMain, StalledContext};
pub use crate::must::{must, must_some};
pub use crate::timing::wait_until;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
