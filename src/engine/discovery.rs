//! Pending-work discovery.
//!
//! Two interchangeable strategies. Portal versions that render the hidden
//! pending-days field hand over every date in one page load; older
//! templates only paint the calendar, which must be scanned one month
//! window at a time. The field wins whenever it is present.
//!
//! Discovery never aborts a run: a failed read for one scope logs a
//! warning and counts as "no pending days found for that period".

use std::time::Duration;

use chromiumoxide::page::Page;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::browser::page::{self, wait_for_visible};
use crate::engine::markers;
use crate::error::{Error, Result};
use crate::model::{MonthReview, PendingDate};
use crate::report::RunLog;

const WIDGET_TIMEOUT: Duration = Duration::from_secs(10);

/// Which discovery mechanism this portal version supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// Hidden field with the full ISO date list. Preferred: one page load
    /// yields everything.
    StructuredField,
    /// Per-month calendar color scan.
    CalendarScan,
}

/// Probe the listing page's capabilities, once per run.
pub async fn detect_strategy(page: &Page) -> DiscoveryStrategy {
    match page.find_element(markers::PENDING_FIELD_SELECTOR).await {
        Ok(_) => DiscoveryStrategy::StructuredField,
        Err(_) => DiscoveryStrategy::CalendarScan,
    }
}

// ---------------------------------------------------------------------------
// Structured-field strategy
// ---------------------------------------------------------------------------

/// Read every pending date from the hidden field.
pub async fn read_pending_field(page: &Page, log: &RunLog<'_>) -> Vec<PendingDate> {
    match try_read_pending_field(page).await {
        Ok(dates) => dates,
        Err(e) => {
            log.warning(format!("could not read pending-days field: {e}"));
            Vec::new()
        }
    }
}

async fn try_read_pending_field(page: &Page) -> Result<Vec<PendingDate>> {
    let field = page.find_element(markers::PENDING_FIELD_SELECTOR).await?;
    // The portal fills the field from script, so read the live property
    // rather than the initial attribute.
    let raw = field
        .call_js_fn("function() { return this.value || ''; }", false)
        .await?
        .result
        .value
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    Ok(parse_pending_field(&raw))
}

/// Parse the field's bracket-delimited, comma-separated ISO date list.
///
/// Plain strip-and-split; the field's exact bracket syntax is not worth
/// a regex, and unparsable fragments are skipped rather than failing the
/// whole list.
pub fn parse_pending_field(raw: &str) -> Vec<PendingDate> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .map(PendingDate)
        .collect()
}

/// Month reviews for the date-driven strategy: the current month always
/// appears; other months appear once per distinct pending month, in
/// first-encounter order.
pub fn months_from_dates(today: NaiveDate, dates: &[PendingDate]) -> Vec<MonthReview> {
    let current_label = format!("{:02}/{}", today.month(), today.year());
    let mut reviews = vec![MonthReview {
        month: current_label.clone(),
        pending_found: dates.iter().any(|d| d.month_label() == current_label),
    }];
    for date in dates {
        let label = date.month_label();
        if reviews.iter().all(|r| r.month != label) {
            reviews.push(MonthReview {
                month: label,
                pending_found: true,
            });
        }
    }
    reviews
}

// ---------------------------------------------------------------------------
// Calendar-scan strategy
// ---------------------------------------------------------------------------

/// One month to review: its `MM/YYYY` label and the representative
/// mid-month date that makes the calendar widget render it.
#[derive(Debug, Clone)]
pub struct MonthWindow {
    pub label: String,
    pub probe: PendingDate,
}

/// The current month followed by `months_back` prior months, newest
/// first. No gaps, no duplicates.
pub fn month_windows(today: NaiveDate, months_back: u32) -> Vec<MonthWindow> {
    let mut year = today.year();
    let mut month = today.month();
    let mut windows = Vec::with_capacity(months_back as usize + 1);
    for _ in 0..=months_back {
        let probe = NaiveDate::from_ymd_opt(year, month, 15).expect("the 15th exists in every month");
        windows.push(MonthWindow {
            label: format!("{month:02}/{year}"),
            probe: PendingDate(probe),
        });
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    windows
}

/// What one rendered calendar cell reports. The widget keeps its month
/// attribute zero-based.
#[derive(Debug, Deserialize)]
struct CalendarCell {
    day: String,
    month: i32,
    year: i32,
    color: String,
}

const COLLECT_CELLS_JS: &str = r##"(() => {
    const cells = [];
    document.querySelectorAll("#ui-datepicker-div td[data-handler='selectDay']").forEach(td => {
        const probe = td.querySelector('a') || td;
        cells.push({
            day: (td.textContent || '').trim(),
            month: Number(td.getAttribute('data-month')),
            year: Number(td.getAttribute('data-year')),
            color: getComputedStyle(probe).backgroundColor,
        });
    });
    return cells;
})()"##;

/// Scan one month window's calendar for flagged days.
pub async fn scan_month(
    page: &Page,
    listing_url: &str,
    window: &MonthWindow,
    settle: Duration,
    log: &RunLog<'_>,
) -> Vec<PendingDate> {
    match try_scan_month(page, listing_url, settle).await {
        Ok(dates) => dates,
        Err(e) => {
            log.warning(format!("calendar scan failed for {}: {e}", window.label));
            Vec::new()
        }
    }
}

async fn try_scan_month(page: &Page, listing_url: &str, settle: Duration) -> Result<Vec<PendingDate>> {
    page::goto(page, listing_url).await?;
    page::settle(settle).await;

    let trigger = wait_for_visible(page, markers::CALENDAR_TRIGGER_SELECTOR, WIDGET_TIMEOUT).await?;
    trigger.click().await?;
    wait_for_visible(page, markers::CALENDAR_CELL_SELECTOR, WIDGET_TIMEOUT).await?;

    let cells: Vec<CalendarCell> = page
        .evaluate(COLLECT_CELLS_JS)
        .await?
        .into_value()
        .map_err(|e| Error::Other(format!("read calendar cells: {e}")))?;

    // Close the widget so it cannot overlap later clicks.
    let _ = page
        .evaluate("document.dispatchEvent(new MouseEvent('mousedown', { bubbles: true }))")
        .await;

    Ok(flagged_dates(&cells))
}

/// Filter flagged cells and turn their attributes into dates.
fn flagged_dates(cells: &[CalendarCell]) -> Vec<PendingDate> {
    let mut dates = Vec::new();
    for cell in cells {
        if !markers::is_flagged_color(&cell.color) {
            continue;
        }
        let Ok(day) = cell.day.parse::<u32>() else {
            continue;
        };
        // data-month is zero-based in the widget's markup.
        let month = cell.month + 1;
        if !(1..=12).contains(&month) {
            continue;
        }
        if let Some(date) = NaiveDate::from_ymd_opt(cell.year, month as u32, day) {
            dates.push(PendingDate(date));
        }
    }
    dates
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Drop duplicate dates while preserving first-encounter order.
pub fn dedup_preserving_order(dates: Vec<PendingDate>) -> Vec<PendingDate> {
    let mut seen = std::collections::HashSet::new();
    dates.into_iter().filter(|d| seen.insert(*d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(day: &str, month: i32, year: i32, color: &str) -> CalendarCell {
        CalendarCell {
            day: day.to_string(),
            month,
            year,
            color: color.to_string(),
        }
    }

    #[test]
    fn flagged_cells_become_dates_with_one_based_months() {
        let cells = vec![
            cell("5", 0, 2025, "rgb(255, 0, 0)"),
            cell("17", 0, 2025, "rgb(204, 0, 0)"),
            cell("20", 0, 2025, "rgb(255, 255, 255)"),
        ];
        let dates = flagged_dates(&cells);
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].display(), "05/01/2025");
        assert_eq!(dates[1].display(), "17/01/2025");
    }

    #[test]
    fn unparsable_cells_are_skipped() {
        let cells = vec![
            cell("", 0, 2025, "rgb(255, 0, 0)"),
            cell("32", 0, 2025, "rgb(255, 0, 0)"),
            cell("10", 12, 2025, "rgb(255, 0, 0)"),
        ];
        assert!(flagged_dates(&cells).is_empty());
    }
}
