//! # mainthread-watchdog
//!
//! Detects when a designated main execution context (a UI thread, an event
//! loop) stops responding within a latency threshold, and reports it.
//!
//! The watchdog is a diagnostic only. It observes and logs; it never tries
//! to unblock the main context.
//!
//! ## How it works
//!
//! A dedicated monitor thread repeatedly submits a trivial ping task to the
//! main context through [`MainContext::submit`], sleeps one threshold
//! window, and reports [`StallEvent::Busy`] if the ping still has not run.
//! It then waits for the ping to execute and reports
//! [`StallEvent::Delayed`] if the time from submission to execution
//! exceeded the threshold. Both events can fire in the same cycle.
//!
//! ## Architecture
//!
//! - [`watchdog`] - Lifecycle owner (`start`, `stop`, `shutdown`)
//! - [`monitor`] - The heartbeat loop and its thread
//! - [`channel`] - Shared ping flag and counting signal
//! - [`signal`] - Instrumented counting semaphore
//! - [`main_context`] - Main-context capability and a FIFO queue adapter
//! - [`event`] - Stall events and reporters
//! - [`stats`] - Heartbeat statistics
//! - [`config`] - Threshold, wait policy, thread name
//! - [`global`] - Optional process-wide instance
//! - [`error`] - Watchdog-specific error types
//!
//! ## Known tradeoff
//!
//! With the default [`WaitPolicy::Unbounded`], a main context that never
//! executes a submitted ping keeps the monitor thread blocked until the
//! process exits; `stop()` cannot release it. [`WaitPolicy::Cancelable`]
//! bounds that at the cost of periodic wake-ups while waiting.
//!
//! ## Example
//!
//! ```rust
//! use mainthread_watchdog::prelude::*;
//! use std::time::Duration;
//!
//! let (queue, main_loop) = main_queue();
//! let mut watchdog = Watchdog::with_reporter(
//!     WatchdogConfig::with_threshold(Duration::from_millis(10)),
//!     queue,
//!     |event: &StallEvent| eprintln!("{event}"),
//! );
//!
//! watchdog.start()?;
//! // The host's main thread keeps draining its queue.
//! for _ in 0..3 {
//!     main_loop.run_next(Duration::from_millis(50));
//! }
//! watchdog.stop();
//! main_loop.run_pending();
//! # Ok::<(), WatchdogError>(())
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod global;
pub mod main_context;
pub mod monitor;
pub mod signal;
pub mod stats;
pub mod watchdog;

pub mod prelude;

pub use channel::HeartbeatChannel;
pub use config::{
    DEFAULT_POLL_INTERVAL, DEFAULT_THREAD_NAME, DEFAULT_THRESHOLD, WaitPolicy, WatchdogConfig,
    WatchdogConfigBuilder,
};
pub use error::{WatchdogError, WatchdogResult};
pub use event::{StallEvent, StallReporter, TracingReporter};
pub use main_context::{MainContext, MainLoop, MainQueue, Task, main_queue};
pub use monitor::{Monitor, MonitorState};
pub use signal::{Semaphore, SignalCounters};
pub use stats::HeartbeatStats;
pub use watchdog::Watchdog;
