//! Integration tests for the reporting boundary.

use capataz::model::LogLevel;
use capataz::report::{BufferedReporter, Reporter, RunLog};

#[test]
fn entries_arrive_in_emission_order_with_levels() {
    let reporter = BufferedReporter::new();
    let log = RunLog::new(&reporter);

    log.info("run started");
    log.success("login completed");
    log.warning("calendar scan failed for 12/2024: timeout");
    log.error("giving up on 05/01/2025 after 3 attempts");

    let entries = reporter.entries();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].level, LogLevel::Info);
    assert_eq!(entries[0].message, "run started");
    assert_eq!(entries[1].level, LogLevel::Success);
    assert_eq!(entries[2].level, LogLevel::Warning);
    assert_eq!(entries[3].level, LogLevel::Error);
}

#[test]
fn timestamps_are_monotonic_in_causal_order() {
    let reporter = BufferedReporter::new();
    let log = RunLog::new(&reporter);

    for i in 0..5 {
        log.info(format!("step {i}"));
    }

    let entries = reporter.entries();
    for window in entries.windows(2) {
        assert!(window[1].timestamp >= window[0].timestamp);
    }
}

#[test]
fn progress_is_capped_at_one_hundred() {
    let reporter = BufferedReporter::new();
    let log = RunLog::new(&reporter);

    log.progress(45);
    log.progress(99);
    log.progress(250);

    assert_eq!(reporter.progress(), vec![45, 99, 100]);
}

#[test]
fn default_on_progress_is_a_no_op() {
    struct LogOnly;
    impl Reporter for LogOnly {
        fn on_log(&self, _entry: &capataz::model::LogEntry) {}
    }

    let log = RunLog::new(&LogOnly);
    log.info("ignored");
    log.progress(50);
}
