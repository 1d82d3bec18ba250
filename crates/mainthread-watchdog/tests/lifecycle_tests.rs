//! Tests for watchdog start/stop/teardown and stall logging.

use mainthread_watchdog::prelude::*;
use mainthread_watchdog_test_helpers::prelude::*;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn test_double_start_keeps_single_monitor() -> TestResult {
    let main = SimulatedMain::spawn(Duration::ZERO);
    let context = CountingContext::new(main.queue());
    let config = WatchdogConfig::builder().threshold_ms(10).build()?;
    let mut watchdog = Watchdog::with_reporter(config, context.clone(), RecordingReporter::new());

    watchdog.start()?;
    watchdog.start()?;
    assert!(watchdog.is_running());

    thread::sleep(Duration::from_millis(150));
    watchdog.stop();
    assert!(wait_until(Duration::from_secs(5), || watchdog.has_exited()));

    // A second monitor would have submitted pings this one never counted.
    assert_eq!(context.submitted() as u64, watchdog.stats().pings_submitted);
    assert!(watchdog.stats().pings_submitted <= 20);

    watchdog.shutdown()?;
    main.shutdown();
    Ok(())
}

#[test]
fn test_start_rejects_invalid_threshold() {
    let (queue, _main_loop) = main_queue();
    let mut watchdog = Watchdog::new(WatchdogConfig::with_threshold(Duration::ZERO), queue);

    let result = watchdog.start();
    assert!(matches!(
        result,
        Err(WatchdogError::InvalidConfiguration(_))
    ));
    assert!(!watchdog.is_running());
    assert!(watchdog.has_exited());
}

#[test]
fn test_stop_is_idempotent_and_non_blocking() -> TestResult {
    let context = StalledContext::new();
    let config = WatchdogConfig::builder().threshold_ms(5).build()?;
    let mut watchdog = Watchdog::with_reporter(config, context.clone(), RecordingReporter::new());

    watchdog.stop();
    watchdog.start()?;
    assert!(wait_until(Duration::from_secs(5), || context.held() == 1));

    // Returns even though the monitor is parked on an unanswered ping.
    watchdog.stop();
    watchdog.stop();
    assert!(!watchdog.is_running());

    assert_eq!(context.release_all(), 1);
    watchdog.shutdown()?;
    Ok(())
}

#[test]
fn test_drop_with_cancelable_policy_joins_monitor() -> TestResult {
    let context = StalledContext::new();
    let config = WatchdogConfig::builder()
        .threshold_ms(5)
        .wait_policy(WaitPolicy::Cancelable {
            poll_interval: Duration::from_millis(5),
        })
        .build()?;
    let reporter = RecordingReporter::new();
    let mut watchdog = Watchdog::with_reporter(config, context.clone(), reporter.clone());

    watchdog.start()?;
    assert!(wait_until(Duration::from_secs(5), || reporter.busy_count() == 1));
    drop(watchdog);

    // The late ping finds its channel gone and does nothing.
    assert_eq!(context.release_all(), 1);
    assert_eq!(reporter.delayed_count(), 0);
    Ok(())
}

#[test]
fn test_shutdown_on_main_context_thread_returns() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);

    let _host = thread::spawn(move || -> WatchdogResult<()> {
        let (queue, main_loop) = main_queue();
        let config = WatchdogConfig::builder().threshold_ms(10).build()?;
        let mut watchdog = Watchdog::with_reporter(config, queue, RecordingReporter::new());

        watchdog.start()?;
        for _ in 0..5 {
            main_loop.run_next(Duration::from_millis(20));
        }
        // Leave the next ping queued on this thread before tearing down.
        thread::sleep(Duration::from_millis(30));
        let result = watchdog.shutdown();
        flag.store(true, Ordering::SeqCst);
        result
    });

    assert!(wait_until(Duration::from_secs(3), || finished.load(Ordering::SeqCst)));
}

#[test]
fn test_start_replaces_monitor_whose_thread_died() -> TestResult {
    let context = StalledContext::new();
    let config = WatchdogConfig::builder().threshold_ms(5).build()?;
    let failing = |event: &StallEvent| {
        if event.is_busy() {
            std::panic::resume_unwind(Box::new("reporter failed"));
        }
    };
    let mut watchdog = Watchdog::with_reporter(config, context.clone(), failing);

    watchdog.start()?;
    assert!(wait_until(Duration::from_secs(5), || watchdog.has_exited()));
    assert!(!watchdog.is_running());
    assert_eq!(context.held(), 1);

    watchdog.start()?;
    assert!(wait_until(Duration::from_secs(5), || context.held() == 2));
    assert!(wait_until(Duration::from_secs(5), || watchdog.has_exited()));
    assert!(!watchdog.is_running());

    assert_eq!(watchdog.shutdown(), Err(WatchdogError::MonitorPanicked));
    assert_eq!(context.release_all(), 2);
    Ok(())
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_tracing_reporter_writes_warn_lines() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        TracingReporter.report(&StallEvent::Busy);
        TracingReporter.report(&StallEvent::Delayed {
            latency: Duration::from_micros(50_250),
        });
    });

    let output = logs.contents();
    assert!(output.contains("WARN"));
    assert!(output.contains("main thread busy"));
    assert!(output.contains("main thread delayed: 50.25 ms"));
    assert!(output.contains("latency_ms="));
}
