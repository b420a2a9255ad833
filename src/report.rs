//! The push-based reporting boundary.
//!
//! A run emits a finite, one-shot sequence of audit-log entries plus
//! coarse progress percentages through a [`Reporter`]. The core never
//! reads entries back; consumers (console, run-history store, live
//! stream) live on the other side of this trait.

use std::sync::Mutex;

use crate::model::{LogEntry, LogLevel};

/// Callback interface supplied by the caller of a run.
pub trait Reporter: Send + Sync {
    fn on_log(&self, entry: &LogEntry);

    /// Coarse progress, 0–100. Optional.
    fn on_progress(&self, _percent: u8) {}
}

/// Mirrors every entry through `tracing`, for operators tailing the
/// process.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn on_log(&self, entry: &LogEntry) {
        match entry.level {
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(level = %entry.level, "{}", entry.message);
            }
            LogLevel::Warning => tracing::warn!("{}", entry.message),
            LogLevel::Error => tracing::error!("{}", entry.message),
        }
    }

    fn on_progress(&self, percent: u8) {
        tracing::info!(percent, "progress");
    }
}

/// Collects entries in memory; the hook the run-history collaborator
/// persists from, and what tests assert against.
#[derive(Debug, Default)]
pub struct BufferedReporter {
    entries: Mutex<Vec<LogEntry>>,
    progress: Mutex<Vec<u8>>,
}

impl BufferedReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("reporter lock poisoned").clone()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.progress.lock().expect("reporter lock poisoned").clone()
    }
}

impl Reporter for BufferedReporter {
    fn on_log(&self, entry: &LogEntry) {
        self.entries
            .lock()
            .expect("reporter lock poisoned")
            .push(entry.clone());
    }

    fn on_progress(&self, percent: u8) {
        self.progress
            .lock()
            .expect("reporter lock poisoned")
            .push(percent);
    }
}

/// Emitter the engine components write through. Stamps entries and pushes
/// them to the reporter synchronously, so emission order is event order.
pub struct RunLog<'a> {
    reporter: &'a dyn Reporter,
}

impl<'a> RunLog<'a> {
    pub fn new(reporter: &'a dyn Reporter) -> Self {
        Self { reporter }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(LogLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message);
    }

    pub fn progress(&self, percent: u8) {
        self.reporter.on_progress(percent.min(100));
    }

    fn emit(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message);
        self.reporter.on_log(&entry);
    }
}
