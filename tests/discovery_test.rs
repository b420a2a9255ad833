//! Integration tests for pending-work discovery's pure core.

use capataz::engine::discovery::{
    dedup_preserving_order, month_windows, months_from_dates, parse_pending_field,
};
use capataz::model::PendingDate;
use chrono::NaiveDate;

fn pending(y: i32, m: u32, d: u32) -> PendingDate {
    PendingDate(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

// ---------------------------------------------------------------------------
// Structured-field parsing
// ---------------------------------------------------------------------------

#[test]
fn bracketed_iso_list_parses_in_order() {
    let dates = parse_pending_field("[2025-01-05,2025-01-17,2025-02-02]");
    assert_eq!(dates.len(), 3);
    assert_eq!(dates[0].display(), "05/01/2025");
    assert_eq!(dates[1].display(), "17/01/2025");
    assert_eq!(dates[2].display(), "02/02/2025");
}

#[test]
fn whitespace_and_blank_entries_are_tolerated() {
    let dates = parse_pending_field("  [ 2025-01-05 , , 2025-01-17 ]  ");
    assert_eq!(dates.len(), 2);
}

#[test]
fn empty_and_junk_fields_yield_nothing() {
    assert!(parse_pending_field("").is_empty());
    assert!(parse_pending_field("[]").is_empty());
    assert!(parse_pending_field("[not-a-date,05/01/2025]").is_empty());
}

#[test]
fn unparsable_fragments_do_not_poison_the_rest() {
    let dates = parse_pending_field("[2025-01-05,garbage,2025-01-17]");
    assert_eq!(dates.len(), 2);
}

// ---------------------------------------------------------------------------
// Month windows
// ---------------------------------------------------------------------------

#[test]
fn windows_cover_current_plus_lookback_newest_first() {
    let today = NaiveDate::from_ymd_opt(2025, 2, 10).expect("valid date");
    let windows = month_windows(today, 2);

    let labels: Vec<&str> = windows.iter().map(|w| w.label.as_str()).collect();
    assert_eq!(labels, ["02/2025", "01/2025", "12/2024"]);

    for window in &windows {
        assert!(window.probe.display().starts_with("15/"));
    }
}

#[test]
fn windows_cross_year_boundaries_without_gaps() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 3).expect("valid date");
    let windows = month_windows(today, 3);
    let labels: Vec<&str> = windows.iter().map(|w| w.label.as_str()).collect();
    assert_eq!(labels, ["01/2025", "12/2024", "11/2024", "10/2024"]);
}

// ---------------------------------------------------------------------------
// Month reviews from discovered dates
// ---------------------------------------------------------------------------

#[test]
fn current_month_always_reviewed_others_once_per_pending_month() {
    let today = NaiveDate::from_ymd_opt(2025, 2, 10).expect("valid date");
    let dates = [
        pending(2025, 1, 5),
        pending(2025, 1, 17),
        pending(2024, 12, 30),
    ];

    let reviews = months_from_dates(today, &dates);
    assert_eq!(reviews.len(), 3);
    assert_eq!(reviews[0].month, "02/2025");
    assert!(!reviews[0].pending_found);
    assert_eq!(reviews[1].month, "01/2025");
    assert!(reviews[1].pending_found);
    assert_eq!(reviews[2].month, "12/2024");
    assert!(reviews[2].pending_found);
}

#[test]
fn no_dates_still_reviews_the_current_month() {
    let today = NaiveDate::from_ymd_opt(2025, 2, 10).expect("valid date");
    let reviews = months_from_dates(today, &[]);
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].month, "02/2025");
    assert!(!reviews[0].pending_found);
}

// ---------------------------------------------------------------------------
// Dedup
// ---------------------------------------------------------------------------

#[test]
fn dedup_keeps_first_encounter_order() {
    let dates = vec![
        pending(2025, 1, 17),
        pending(2025, 1, 5),
        pending(2025, 1, 17),
        pending(2025, 1, 5),
    ];
    let deduped = dedup_preserving_order(dates);
    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0].display(), "17/01/2025");
    assert_eq!(deduped[1].display(), "05/01/2025");
}
