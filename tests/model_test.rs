//! Integration tests for the run data model.

use capataz::model::{DaySummary, MonthReview, PendingDate, RunSummary};
use chrono::NaiveDate;

fn pending(y: i32, m: u32, d: u32) -> PendingDate {
    PendingDate(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

fn day(date: &PendingDate, validated: u32, obras: &[&str]) -> DaySummary {
    DaySummary {
        date: date.display(),
        workers_validated: validated,
        obras: obras.iter().map(|s| s.to_string()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Accounting invariant
// ---------------------------------------------------------------------------

#[test]
fn total_validated_equals_sum_over_days() {
    let mut summary = RunSummary::new();
    summary.record_day(day(&pending(2025, 1, 5), 3, &["Obra Norte"]));
    summary.record_day(day(&pending(2025, 1, 17), 3, &["Obra Norte", "Obra Sur"]));
    summary.record_day(day(&pending(2025, 2, 2), 0, &[]));

    let sum: u32 = summary.days.iter().map(|d| d.workers_validated).sum();
    assert_eq!(summary.total_validated, sum);
    assert_eq!(summary.total_validated, 6);
}

#[test]
fn zero_result_days_still_appear_in_the_summary() {
    let mut summary = RunSummary::new();
    summary.record_day(DaySummary::empty(&pending(2025, 1, 5)));

    assert_eq!(summary.total_validated, 0);
    assert_eq!(summary.days.len(), 1);
    assert_eq!(summary.days[0].date, "05/01/2025");
    assert!(summary.days[0].obras.is_empty());
}

// ---------------------------------------------------------------------------
// Per-date uniqueness
// ---------------------------------------------------------------------------

#[test]
fn has_day_flags_already_processed_dates() {
    let mut summary = RunSummary::new();
    let date = pending(2025, 1, 5);
    assert!(!summary.has_day(&date));

    summary.record_day(day(&date, 2, &["Obra Norte"]));
    assert!(summary.has_day(&date));
    assert!(!summary.has_day(&pending(2025, 1, 6)));
}

// ---------------------------------------------------------------------------
// Months and errors
// ---------------------------------------------------------------------------

#[test]
fn months_and_errors_accumulate_in_order() {
    let mut summary = RunSummary::new();
    summary.record_month(MonthReview {
        month: "02/2025".to_string(),
        pending_found: false,
    });
    summary.record_month(MonthReview {
        month: "01/2025".to_string(),
        pending_found: true,
    });
    summary.record_error("05/01/2025: portal hiccup");

    assert_eq!(summary.months_reviewed.len(), 2);
    assert_eq!(summary.months_reviewed[0].month, "02/2025");
    assert!(summary.months_reviewed[1].pending_found);
    assert_eq!(summary.errors, vec!["05/01/2025: portal hiccup"]);
}

// ---------------------------------------------------------------------------
// Date formats
// ---------------------------------------------------------------------------

#[test]
fn pending_dates_render_portal_formats() {
    let date = pending(2025, 1, 5);
    assert_eq!(date.display(), "05/01/2025");
    assert_eq!(date.query(), "05%2F01%2F2025");
    assert_eq!(date.month_label(), "01/2025");
    assert_eq!(date.to_string(), "05/01/2025");
}

#[test]
fn summaries_serialize_for_the_persistence_layer() {
    let mut summary = RunSummary::new();
    summary.record_day(day(&pending(2025, 1, 5), 3, &["Obra Norte"]));

    let json = serde_json::to_value(&summary).expect("serializable");
    assert_eq!(json["total_validated"], 3);
    assert_eq!(json["days"][0]["date"], "05/01/2025");
    assert_eq!(json["days"][0]["obras"][0], "Obra Norte");
}
