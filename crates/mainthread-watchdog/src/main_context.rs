//! The main execution context being watched.
//!
//! The watchdog only needs one capability from the host: a way to schedule a
//! closure on the main context, in FIFO order with other queued work. Hosts
//! that already own an event loop implement [`MainContext`] (or pass a
//! closure) that forwards to it. Hosts without one can use [`main_queue`],
//! which hands back a submitter and a [`MainLoop`] to drain on the main
//! thread.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::time::Duration;

/// A unit of work scheduled on the main context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run tasks on the main context.
pub trait MainContext: Send + Sync + 'static {
    /// Schedule `task` to run on the main context after previously
    /// submitted work.
    fn submit(&self, task: Task);
}

impl<F> MainContext for F
where
    F: Fn(Task) + Send + Sync + 'static,
{
    fn submit(&self, task: Task) {
        self(task);
    }
}

/// Create a FIFO task queue for a host without its own event loop.
#[must_use]
pub fn main_queue() -> (MainQueue, MainLoop) {
    let (tx, rx) = channel::unbounded();
    (MainQueue { tx }, MainLoop { rx })
}

/// Submitting half of [`main_queue`]. Cheap to clone.
#[derive(Clone)]
pub struct MainQueue {
    tx: Sender<Task>,
}

impl MainContext for MainQueue {
    fn submit(&self, task: Task) {
        if self.tx.send(task).is_err() {
            tracing::debug!("main loop dropped, discarding submitted task");
        }
    }
}

impl fmt::Debug for MainQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainQueue")
            .field("queued", &self.tx.len())
            .finish()
    }
}

/// Draining half of [`main_queue`]; owned by the main thread.
pub struct MainLoop {
    rx: Receiver<Task>,
}

impl MainLoop {
    /// Run every task already queued without blocking.
    ///
    /// Returns the number of tasks executed.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0usize;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran = ran.saturating_add(1);
        }
        ran
    }

    /// Wait up to `timeout` for the next task and run it.
    ///
    /// Returns `false` if nothing arrived or every submitter is gone.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.next_task(timeout) {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Wait up to `timeout` for the next task without running it.
    ///
    /// Lets the host interleave its own work before executing the task.
    #[must_use]
    pub fn next_task(&self, timeout: Duration) -> Option<Task> {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => Some(task),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Run tasks until every [`MainQueue`] handle has been dropped.
    pub fn run(&self) {
        for task in &self.rx {
            task();
        }
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no tasks are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainLoop")
            .field("queued", &self.rx.len())
            .finish()
    }
}
