//! Prelude for mainthread-watchdog.
//!
//! This module re-exports the most commonly used types for convenient importing.
//!
//! # Example
//!
//! ```rust
//! use mainthread_watchdog::prelude::*;
//!
//! let (queue, _main_loop) = main_queue();
//! let watchdog = Watchdog::new(WatchdogConfig::default(), queue);
//! assert!(!watchdog.is_running());
//! ```

pub use crate::channel::HeartbeatChannel;
pub use crate::config::{WaitPolicy, WatchdogConfig, WatchdogConfigBuilder};
pub use crate::error::{WatchdogError, WatchdogResult};
pub use crate::event::{StallEvent, StallReporter, TracingReporter};
pub use crate::main_context::{MainContext, MainLoop, MainQueue, Task, main_queue};
pub use crate::monitor::{Monitor, MonitorState};
pub use crate::stats::HeartbeatStats;
pub use crate::watchdog::Watchdog;
