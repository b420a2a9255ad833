//! Run data model.
//!
//! Everything here lives and dies within a single run. Pending dates are
//! discovered fresh every time; portal state changes between runs and
//! after each validation action. Summaries accumulate incrementally and
//! become immutable at run end; persisting them is the surrounding
//! system's job.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Log stream
// ---------------------------------------------------------------------------

/// Severity of an audit-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// One audit-log line. Immutable, emitted synchronously in causal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pending dates
// ---------------------------------------------------------------------------

/// A calendar date with outstanding validations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PendingDate(pub NaiveDate);

impl PendingDate {
    /// The portal's display form, `DD/MM/YYYY`.
    pub fn display(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }

    /// The display form with slashes percent-encoded for a query string.
    pub fn query(&self) -> String {
        self.0.format("%d%%2F%m%%2F%Y").to_string()
    }

    /// The `MM/YYYY` label of the month this date falls in.
    pub fn month_label(&self) -> String {
        self.0.format("%m/%Y").to_string()
    }
}

impl std::fmt::Display for PendingDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Outcome of one processed date. Created once by the day processor when
/// the date completes (success or exhausted retries), never mutated after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    /// `DD/MM/YYYY`.
    pub date: String,
    /// Individual worker-day entries successfully validated.
    pub workers_validated: u32,
    /// Job-site display names processed that day, in processing order.
    pub obras: Vec<String>,
}

impl DaySummary {
    /// The zero-result summary for a date.
    pub fn empty(date: &PendingDate) -> Self {
        Self {
            date: date.display(),
            workers_validated: 0,
            obras: Vec::new(),
        }
    }
}

/// One reviewed month window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthReview {
    /// `MM/YYYY`.
    pub month: String,
    pub pending_found: bool,
}

/// Aggregate outcome of one run. Owned by the orchestrator and accumulated
/// incrementally, so partial progress survives a late abort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_validated: u32,
    pub days: Vec<DaySummary>,
    pub months_reviewed: Vec<MonthReview>,
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed day. The only path that touches
    /// `total_validated`, which keeps it equal to the sum over `days`.
    pub fn record_day(&mut self, day: DaySummary) {
        self.total_validated += day.workers_validated;
        self.days.push(day);
    }

    /// Whether a date was already processed this run. A date can surface
    /// in more than one discovery scope but is processed at most once.
    pub fn has_day(&self, date: &PendingDate) -> bool {
        let display = date.display();
        self.days.iter().any(|d| d.date == display)
    }

    pub fn record_month(&mut self, month: MonthReview) {
        self.months_reviewed.push(month);
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}
