//! The per-date state machine.
//!
//! One date moves through: load listing → no pending work (terminal) |
//! enumerate sites → per-site validation → done. Any failure inside an
//! attempt re-enters loading after a pause, up to the retry budget;
//! exhaustion yields a zero-result summary and the run moves on to the
//! next date. Retry state lives entirely in this call; no module-level
//! mutable state.

use std::time::{Duration, Instant};

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;

use crate::browser::page::{self, current_url, visible_elements};
use crate::engine::markers;
use crate::engine::validate::{self, ValidateConfig};
use crate::error::{Error, Result};
use crate::model::{DaySummary, PendingDate};
use crate::report::RunLog;

const SUBPAGE_POLL: Duration = Duration::from_millis(250);

/// Knobs for day processing.
#[derive(Debug, Clone)]
pub struct DayConfig {
    /// Attempts per date before giving up on it.
    pub retries: u32,
    /// Pause between attempts.
    pub retry_pause: Duration,
    /// Settle pause after navigation and clicks.
    pub settle: Duration,
    /// Bounded wait for the validation subpage to be reached.
    pub subpage_timeout: Duration,
    /// Display cap for extracted site labels.
    pub label_cap: usize,
    pub validate: ValidateConfig,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_pause: Duration::from_secs(2),
            settle: Duration::from_millis(800),
            subpage_timeout: Duration::from_secs(15),
            label_cap: 80,
            validate: ValidateConfig::default(),
        }
    }
}

/// Terminal result of one date.
#[derive(Debug)]
pub enum DayResult {
    Completed(DaySummary),
    /// All attempts failed. Carries the zero-result summary and the last
    /// error; the warning/error trail is already in the log.
    Exhausted(DaySummary, String),
}

impl DayResult {
    pub fn into_summary(self) -> DaySummary {
        match self {
            DayResult::Completed(summary) | DayResult::Exhausted(summary, _) => summary,
        }
    }
}

/// Listing URL for one date.
pub fn listing_url(portal_url: &str, date: &PendingDate) -> String {
    format!("{portal_url}{}?fecha={}", markers::PENDING_PATH, date.query())
}

/// Process one date. Never fails: exhausted retries produce a zero-result
/// summary plus an error log line, and the run continues.
pub async fn process_day(
    page: &Page,
    portal_url: &str,
    date: &PendingDate,
    config: &DayConfig,
    log: &RunLog<'_>,
) -> DayResult {
    with_retries(date, config, log, || {
        attempt_day(page, portal_url, date, config, log)
    })
    .await
}

/// Drive attempts until one succeeds or the budget is exhausted. Emits
/// one warning per failed attempt before the last and one error after
/// the last.
pub(crate) async fn with_retries<F, Fut>(
    date: &PendingDate,
    config: &DayConfig,
    log: &RunLog<'_>,
    mut attempt: F,
) -> DayResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<DaySummary>>,
{
    let retries = config.retries.max(1);
    let mut last_error = String::new();
    for n in 1..=retries {
        match attempt().await {
            Ok(summary) => return DayResult::Completed(summary),
            Err(e) => {
                last_error = e.to_string();
                if n < retries {
                    log.warning(format!("attempt {n}/{retries} failed for {date}: {e}"));
                    page::settle(config.retry_pause).await;
                } else {
                    log.error(format!("giving up on {date} after {retries} attempts: {e}"));
                }
            }
        }
    }
    DayResult::Exhausted(DaySummary::empty(date), last_error)
}

async fn attempt_day(
    page: &Page,
    portal_url: &str,
    date: &PendingDate,
    config: &DayConfig,
    log: &RunLog<'_>,
) -> Result<DaySummary> {
    let url = listing_url(portal_url, date);
    page::goto(page, &url).await?;
    page::settle(config.settle).await;

    let body = page::body_text(page).await?;
    if markers::has_empty_day_marker(&body) {
        log.info(format!("no pending work on {date}"));
        return Ok(DaySummary::empty(date));
    }

    let expected = visible_elements(page, markers::SITE_ACTION_SELECTOR).await?.len();
    if expected == 0 {
        // No empty-state marker but no actions either; treat like an
        // empty day rather than failing the attempt.
        log.warning(format!("no validation actions visible on {date}"));
        return Ok(DaySummary::empty(date));
    }

    log.info(format!("{expected} site(s) with pending entries on {date}"));

    let mut summary = DaySummary::empty(date);
    for index in 0..expected {
        // Submitting a validation re-renders the listing, so the button
        // list is stale after every site: reload and re-query instead of
        // trusting indices.
        page::goto(page, &url).await?;
        page::settle(config.settle).await;

        let buttons = visible_elements(page, markers::SITE_ACTION_SELECTOR).await?;
        let Some(button) = buttons.into_iter().next() else {
            // Fewer buttons than first counted: the remaining sites were
            // cleared by earlier submissions. Normal completion.
            break;
        };

        let obra = site_label(&button, config.label_cap).await;
        log.info(format!("validating site {} of {expected}: {obra}", index + 1));

        button.click().await?;
        wait_for_validation_subpage(page, config.subpage_timeout).await?;
        page::settle(config.settle).await;

        let validated = validate::validate_current_page(page, &config.validate, log).await?;
        summary.workers_validated += validated;
        summary.obras.push(obra);
    }

    Ok(summary)
}

/// Wait until the browser lands on a validation subpage, identified by a
/// URL fragment.
async fn wait_for_validation_subpage(page: &Page, timeout: Duration) -> Result<()> {
    let started = Instant::now();
    loop {
        let url = current_url(page).await?;
        if url.to_lowercase().contains(markers::VALIDATION_URL_FRAGMENT) {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(Error::WaitTimeout {
                selector: format!("url containing `{}`", markers::VALIDATION_URL_FRAGMENT),
                waited_ms: started.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(SUBPAGE_POLL).await;
    }
}

/// Human-readable site label from the row enclosing an action element.
/// Display-only: it feeds the audit log and summary, nothing else.
async fn site_label(button: &Element, cap: usize) -> String {
    let raw = button
        .call_js_fn(
            "function() { const row = this.closest('tr, .fila, .row'); return row ? row.innerText : ''; }",
            false,
        )
        .await
        .ok()
        .and_then(|ret| ret.result.value)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let label = markers::collapse_label(&raw, cap);
    if label.is_empty() {
        "unnamed site".to_string()
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLevel;
    use crate::report::{BufferedReporter, RunLog};
    use chrono::NaiveDate;

    fn date() -> PendingDate {
        PendingDate(NaiveDate::from_ymd_opt(2025, 1, 5).expect("valid date"))
    }

    fn fast_config() -> DayConfig {
        DayConfig {
            retry_pause: Duration::ZERO,
            ..DayConfig::default()
        }
    }

    #[tokio::test]
    async fn exhausted_retries_yield_zero_summary_and_log_trail() {
        let reporter = BufferedReporter::new();
        let log = RunLog::new(&reporter);
        let config = fast_config();

        let result = with_retries(&date(), &config, &log, || async {
            Err::<DaySummary, _>(Error::Other("portal hiccup".to_string()))
        })
        .await;

        let DayResult::Exhausted(summary, error) = result else {
            panic!("expected Exhausted");
        };
        assert_eq!(summary.date, "05/01/2025");
        assert_eq!(summary.workers_validated, 0);
        assert!(summary.obras.is_empty());
        assert_eq!(error, "portal hiccup");

        let entries = reporter.entries();
        let warnings = entries
            .iter()
            .filter(|e| e.level == LogLevel::Warning)
            .count();
        let errors = entries.iter().filter(|e| e.level == LogLevel::Error).count();
        assert_eq!(warnings, config.retries as usize - 1);
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn first_success_stops_retrying() {
        let reporter = BufferedReporter::new();
        let log = RunLog::new(&reporter);
        let config = fast_config();

        let mut calls = 0u32;
        let result = with_retries(&date(), &config, &log, || {
            calls += 1;
            async { Ok(DaySummary::empty(&date())) }
        })
        .await;

        assert!(matches!(result, DayResult::Completed(_)));
        assert_eq!(calls, 1);
        assert!(reporter.entries().is_empty());
    }

    #[test]
    fn listing_urls_carry_the_encoded_date() {
        let url = listing_url("https://obras.ejemplo.com", &date());
        assert_eq!(
            url,
            "https://obras.ejemplo.com/partes/pendientes?fecha=05%2F01%2F2025"
        );
    }
}
