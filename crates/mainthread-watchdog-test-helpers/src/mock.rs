//! Mock main contexts and reporters.

use mainthread_watchdog::{MainContext, MainQueue, StallEvent, StallReporter, Task, main_queue};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Reporter that keeps every event it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<StallEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StallEvent> {
        self.events.lock().clone()
    }

    pub fn busy_count(&self) -> usize {
        self.events.lock().iter().filter(|e| e.is_busy()).count()
    }

    pub fn delayed_count(&self) -> usize {
        self.events.lock().iter().filter(|e| e.is_delayed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl StallReporter for RecordingReporter {
    fn report(&self, event: &StallEvent) {
        self.events.lock().push(*event);
    }
}

/// A simulated main thread draining a `MainLoop`, sleeping `delay` before
/// running each task.
#[derive(Debug)]
pub struct SimulatedMain {
    queue: MainQueue,
    stop: Arc<AtomicBool>,
    executed: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl SimulatedMain {
    pub fn spawn(delay: Duration) -> Self {
        let (queue, main_loop) = main_queue();
        let stop = Arc::new(AtomicBool::new(false));
        let executed = Arc::new(AtomicUsize::new(0));

        let thread_stop = Arc::clone(&stop);
        let thread_executed = Arc::clone(&executed);
        let handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::Acquire) {
                if let Some(task) = main_loop.next_task(Duration::from_millis(5)) {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    task();
                    thread_executed.fetch_add(1, Ordering::AcqRel);
                }
            }
        });

        Self {
            queue,
            stop,
            executed,
            handle: Some(handle),
        }
    }

    /// Submitter for this main thread.
    pub fn queue(&self) -> MainQueue {
        self.queue.clone()
    }

    /// Tasks executed so far.
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::Acquire)
    }

    /// Stop draining, join the thread and return how many tasks it ran.
    pub fn shutdown(mut self) -> usize {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            assert!(handle.join().is_ok(), "simulated main thread panicked");
        }
        self.executed()
    }
}

impl Drop for SimulatedMain {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// Main context that counts submissions before forwarding them.
#[derive(Debug, Clone)]
pub struct CountingContext {
    inner: MainQueue,
    submitted: Arc<AtomicUsize>,
}

impl CountingContext {
    pub fn new(inner: MainQueue) -> Self {
        Self {
            inner,
            submitted: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Acquire)
    }
}

impl MainContext for CountingContext {
    fn submit(&self, task: Task) {
        self.submitted.fetch_add(1, Ordering::AcqRel);
        self.inner.submit(task);
    }
}

/// Main context that holds on to every task without running it, standing
/// in for a deadlocked main thread.
#[derive(Clone, Default)]
pub struct StalledContext {
    held: Arc<Mutex<Vec<Task>>>,
}

impl StalledContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks submitted and not yet released.
    pub fn held(&self) -> usize {
        self.held.lock().len()
    }

    /// Let the main context run everything it was sitting on.
    pub fn release_all(&self) -> usize {
        let tasks: Vec<Task> = self.held.lock().drain(..).collect();
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl MainContext for StalledContext {
    fn submit(&self, task: Task) {
        self.held.lock().push(task);
    }
}

impl fmt::Debug for StalledContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StalledContext")
            .field("held", &self.held.lock().len())
            .finish()
    }
}
