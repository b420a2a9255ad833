//! Entry validation within one job site's validation page.
//!
//! The portal serves two mutually exclusive page shapes. The kind is
//! resolved once per visit by probing for each shape's distinguishing
//! control, then dispatched; the polling and confirm scaffolding is
//! shared rather than duplicated per shape.

use std::time::{Duration, Instant};

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;

use crate::browser::page::{self, visible_elements};
use crate::engine::markers;
use crate::error::{Error, Result};
use crate::report::RunLog;

const DIALOG_POLL: Duration = Duration::from_millis(250);

/// Which validation UI the current page carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Worker rows with per-row checkboxes and a single submit.
    Itemized,
    /// Standalone per-report validate buttons, no checkboxes.
    BatchReport,
    /// Explicit empty-state marker: nothing left here.
    Empty,
    /// None of the known shapes; usually a previous attempt already
    /// finished the job.
    Unknown,
}

/// Outcome of a bounded wait for an optional confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Accepted,
    Absent,
}

/// Knobs for the validator. Defaults match the portal's observed pacing.
#[derive(Debug, Clone)]
pub struct ValidateConfig {
    /// Settle pause after each UI-mutating click.
    pub settle: Duration,
    /// Bounded wait for each optional confirmation dialog.
    pub dialog_timeout: Duration,
    /// Hard cap on batch-report click cycles, in case the DOM stops
    /// shrinking.
    pub max_report_cycles: u32,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(800),
            dialog_timeout: Duration::from_secs(4),
            max_report_cycles: 25,
        }
    }
}

/// Resolve which UI shape the current page carries.
pub async fn detect_page_kind(page: &Page) -> Result<PageKind> {
    let body = page::body_text(page).await.unwrap_or_default();
    if markers::has_empty_day_marker(&body) {
        return Ok(PageKind::Empty);
    }
    if !visible_elements(page, markers::WORKER_CHECKBOX_SELECTOR)
        .await?
        .is_empty()
    {
        return Ok(PageKind::Itemized);
    }
    if !visible_elements(page, markers::REPORT_ACTION_SELECTOR)
        .await?
        .is_empty()
    {
        return Ok(PageKind::BatchReport);
    }
    Ok(PageKind::Unknown)
}

/// Validate everything on the current page, returning how many worker-day
/// entries (or reports) were validated.
pub async fn validate_current_page(
    page: &Page,
    config: &ValidateConfig,
    log: &RunLog<'_>,
) -> Result<u32> {
    match detect_page_kind(page).await? {
        PageKind::Itemized => validate_itemized(page, config, log).await,
        PageKind::BatchReport => validate_reports(page, config, log).await,
        PageKind::Empty => {
            log.info("nothing to validate on this page");
            Ok(0)
        }
        PageKind::Unknown => {
            log.warning("validation page has neither checkboxes nor report buttons, skipping");
            Ok(0)
        }
    }
}

/// Itemized variant: select every worker row, submit once, accept up to
/// two optional confirmation dialogs.
async fn validate_itemized(page: &Page, config: &ValidateConfig, log: &RunLog<'_>) -> Result<u32> {
    let checkboxes = visible_elements(page, markers::WORKER_CHECKBOX_SELECTOR).await?;
    let total = checkboxes.len() as u32;

    let select_all = visible_elements(page, markers::SELECT_ALL_SELECTOR).await?;
    if let Some(select_all) = select_all.first() {
        select_all.click().await?;
    } else {
        for checkbox in &checkboxes {
            if !is_checked(checkbox).await {
                checkbox.click().await?;
            }
        }
    }
    page::settle(config.settle).await;

    // A page with rows but no submit control is broken in a way retrying
    // the whole day may fix; missing dialogs below are not.
    let submit = visible_elements(page, markers::SUBMIT_SELECTED_SELECTOR).await?;
    let Some(submit) = submit.into_iter().next() else {
        return Err(Error::SubmitButtonMissing);
    };
    submit.click().await?;
    page::settle(config.settle).await;

    // Up to two sequential dialogs. Both optional; a second one only ever
    // follows a first.
    if accept_optional_dialog(page, config).await? == DialogOutcome::Accepted {
        accept_optional_dialog(page, config).await?;
    }

    log.success(format!("validated {total} worker entries"));
    Ok(total)
}

/// Batch-report variant: each confirmed click removes its button from the
/// DOM, so the list is re-queried every cycle rather than walked by
/// index.
async fn validate_reports(page: &Page, config: &ValidateConfig, log: &RunLog<'_>) -> Result<u32> {
    let mut validated = 0u32;

    for _ in 0..config.max_report_cycles {
        let buttons = visible_elements(page, markers::REPORT_ACTION_SELECTOR).await?;
        let Some(button) = buttons.into_iter().next() else {
            break;
        };
        button.click().await?;
        page::settle(config.settle).await;

        accept_optional_dialog(page, config).await?;
        page::settle(config.settle).await;

        validated += 1;
    }

    if validated >= config.max_report_cycles
        && !visible_elements(page, markers::REPORT_ACTION_SELECTOR)
            .await?
            .is_empty()
    {
        log.warning(format!(
            "report actions still present after {} cycles, leaving the rest",
            config.max_report_cycles
        ));
    }

    if validated > 0 {
        log.success(format!("validated {validated} reports"));
    }
    Ok(validated)
}

/// Bounded wait for a confirmation dialog, accepting it if one appears.
///
/// Only the wait-timeout outcome maps to [`DialogOutcome::Absent`]; any
/// other failure is real and propagates.
pub async fn accept_optional_dialog(
    page: &Page,
    config: &ValidateConfig,
) -> Result<DialogOutcome> {
    match wait_for_accept_button(page, config.dialog_timeout).await {
        Ok(button) => {
            button.click().await?;
            page::settle(config.settle).await;
            Ok(DialogOutcome::Accepted)
        }
        Err(Error::WaitTimeout { .. }) => Ok(DialogOutcome::Absent),
        Err(e) => Err(e),
    }
}

async fn wait_for_accept_button(page: &Page, timeout: Duration) -> Result<Element> {
    let started = Instant::now();
    loop {
        for button in visible_elements(page, markers::DIALOG_BUTTON_SELECTOR).await? {
            let label = button.inner_text().await.ok().flatten().unwrap_or_default();
            if markers::is_accept_label(&label) {
                return Ok(button);
            }
        }
        if started.elapsed() >= timeout {
            return Err(Error::WaitTimeout {
                selector: markers::DIALOG_BUTTON_SELECTOR.to_string(),
                waited_ms: started.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(DIALOG_POLL).await;
    }
}

async fn is_checked(element: &Element) -> bool {
    match element
        .call_js_fn("function() { return this.checked === true; }", false)
        .await
    {
        Ok(ret) => ret.result.value.and_then(|v| v.as_bool()).unwrap_or(false),
        Err(_) => false,
    }
}
