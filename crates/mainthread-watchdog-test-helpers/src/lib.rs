//! Shared test utilities for mainthread-watchdog.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`mock`] - Simulated main threads, stalled contexts and recording reporters
//! - [`timing`] - Polling helpers for thread-timing assertions
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! mainthread-watchdog-test-helpers = { workspace = true }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic, reason = "helpers report failures by panicking")]

pub mod mock;
pub mod must;
pub mod prelude;
pub mod timing;

pub use must::*;
