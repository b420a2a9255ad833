//! Run orchestration: session acquisition, login, discovery, per-date
//! processing, final re-verification, teardown.

pub mod day;
pub mod discovery;
pub mod login;
pub mod markers;
pub mod validate;

use std::time::Duration;

use chromiumoxide::page::Page;
use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::browser::BrowserSession;
use crate::browser::page;
use crate::config::{BrowserStrategy, Credentials};
use crate::error::Result;
use crate::model::{MonthReview, PendingDate, RunSummary};
use crate::report::{Reporter, RunLog};

use self::day::{DayConfig, DayResult};
use self::discovery::DiscoveryStrategy;

/// Knobs for a whole run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Bounded browser acquisition.
    pub browser_timeout: Duration,
    /// Settle pause for orchestrator-level navigation.
    pub settle: Duration,
    pub day: DayConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            browser_timeout: Duration::from_secs(30),
            settle: Duration::from_millis(800),
            day: DayConfig::default(),
        }
    }
}

/// The run orchestrator. One instance can serve many runs; each run is a
/// single strictly sequential task over its own browser context.
pub struct Runner {
    portal_url: String,
    browser: BrowserStrategy,
    config: RunnerConfig,
}

impl Runner {
    pub fn new(portal_url: impl Into<String>, browser: BrowserStrategy) -> Self {
        let portal_url: String = portal_url.into();
        Self {
            portal_url: portal_url.trim_end_matches('/').to_string(),
            browser,
            config: RunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute one full validation run.
    ///
    /// The session is released on every exit path, and only the context
    /// this run created is destroyed; never a shared browser process.
    /// The caller must serialize runs per credential set; two runs
    /// driving the same portal session concurrently corrupt each other.
    pub async fn run(
        &self,
        credentials: &Credentials,
        months_back: u32,
        reporter: &dyn Reporter,
    ) -> Result<RunSummary> {
        let log = RunLog::new(reporter);
        log.info(format!("run started for {}", credentials.username));

        let session = BrowserSession::acquire(&self.browser, self.config.browser_timeout).await?;
        let result = self
            .run_inner(session.page(), credentials, months_back, &log)
            .await;
        session.release().await;

        match &result {
            Ok(summary) => log.success(format!(
                "run finished: {} entries validated across {} day(s)",
                summary.total_validated,
                summary.days.len()
            )),
            Err(e) => log.error(format!("run aborted: {e}")),
        }
        result
    }

    /// Discovery-only pass: log in, list pending days, validate nothing.
    /// The operator's dry run.
    pub async fn discover(
        &self,
        credentials: &Credentials,
        months_back: u32,
        reporter: &dyn Reporter,
    ) -> Result<Vec<PendingDate>> {
        let log = RunLog::new(reporter);
        let session = BrowserSession::acquire(&self.browser, self.config.browser_timeout).await?;
        let result = self
            .discover_inner(session.page(), credentials, months_back, &log)
            .await;
        session.release().await;
        result
    }

    async fn run_inner(
        &self,
        page: &Page,
        credentials: &Credentials,
        months_back: u32,
        log: &RunLog<'_>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::new();

        login::login(page, &self.portal_url, credentials, log).await?;

        let today = Utc::now().date_naive();
        let strategy = self.land_and_detect(page, today).await?;
        info!(?strategy, "discovery strategy selected");

        match strategy {
            DiscoveryStrategy::StructuredField => {
                let dates = discovery::dedup_preserving_order(
                    discovery::read_pending_field(page, log).await,
                );
                for review in discovery::months_from_dates(today, &dates) {
                    summary.record_month(review);
                }
                log.info(format!("{} pending day(s) discovered", dates.len()));
                self.process_dates(page, &dates, &mut summary, log, 0, 99).await;
            }
            DiscoveryStrategy::CalendarScan => {
                let windows = discovery::month_windows(today, months_back);
                let count = windows.len() as u32;
                for (i, window) in windows.iter().enumerate() {
                    let url = day::listing_url(&self.portal_url, &window.probe);
                    let dates = discovery::dedup_preserving_order(
                        discovery::scan_month(page, &url, window, self.config.settle, log).await,
                    );
                    summary.record_month(MonthReview {
                        month: window.label.clone(),
                        pending_found: !dates.is_empty(),
                    });
                    if dates.is_empty() {
                        log.info(format!("no pending days in {}", window.label));
                    } else {
                        log.info(format!(
                            "{} pending day(s) in {}",
                            dates.len(),
                            window.label
                        ));
                        let base = i as u32 * 99 / count;
                        let span = 99 / count;
                        self.process_dates(page, &dates, &mut summary, log, base, span)
                            .await;
                    }
                    log.progress(((i as u32 + 1) * 99 / count) as u8);
                }
            }
        }

        self.verify_clean(page, today, months_back, strategy, log).await;

        Ok(summary)
    }

    async fn discover_inner(
        &self,
        page: &Page,
        credentials: &Credentials,
        months_back: u32,
        log: &RunLog<'_>,
    ) -> Result<Vec<PendingDate>> {
        login::login(page, &self.portal_url, credentials, log).await?;

        let today = Utc::now().date_naive();
        match self.land_and_detect(page, today).await? {
            DiscoveryStrategy::StructuredField => Ok(discovery::dedup_preserving_order(
                discovery::read_pending_field(page, log).await,
            )),
            DiscoveryStrategy::CalendarScan => {
                let mut all = Vec::new();
                for window in discovery::month_windows(today, months_back) {
                    let url = day::listing_url(&self.portal_url, &window.probe);
                    all.extend(
                        discovery::scan_month(page, &url, &window, self.config.settle, log).await,
                    );
                }
                Ok(discovery::dedup_preserving_order(all))
            }
        }
    }

    /// Land on today's listing and probe which discovery mechanism this
    /// portal version supports.
    async fn land_and_detect(&self, page: &Page, today: NaiveDate) -> Result<DiscoveryStrategy> {
        let today_url = day::listing_url(&self.portal_url, &PendingDate(today));
        page::goto(page, &today_url).await?;
        page::settle(self.config.settle).await;
        Ok(discovery::detect_strategy(page).await)
    }

    /// Process a batch of dates, reporting coarse progress after each.
    /// `base`/`span` place this batch inside the run's 0–99 range; 100 is
    /// reserved for the final verification.
    async fn process_dates(
        &self,
        page: &Page,
        dates: &[PendingDate],
        summary: &mut RunSummary,
        log: &RunLog<'_>,
        base: u32,
        span: u32,
    ) {
        let total = dates.len() as u32;
        for (done, date) in dates.iter().enumerate() {
            if summary.has_day(date) {
                continue;
            }
            match day::process_day(page, &self.portal_url, date, &self.config.day, log).await {
                DayResult::Completed(day) => summary.record_day(day),
                DayResult::Exhausted(day, error) => {
                    summary.record_error(format!("{}: {error}", day.date));
                    summary.record_day(day);
                }
            }
            let percent = base + (done as u32 + 1) * span / total.max(1);
            log.progress(percent.min(99) as u8);
        }
    }

    /// Advisory final pass: discovery should now find nothing. Leftovers
    /// are warned about, never failed on; the portal may legitimately
    /// have gained new entries mid-run.
    async fn verify_clean(
        &self,
        page: &Page,
        today: NaiveDate,
        months_back: u32,
        strategy: DiscoveryStrategy,
        log: &RunLog<'_>,
    ) {
        let remaining = match strategy {
            DiscoveryStrategy::StructuredField => {
                let today_url = day::listing_url(&self.portal_url, &PendingDate(today));
                if page::goto(page, &today_url).await.is_err() {
                    log.warning("could not reload listing for final verification");
                    return;
                }
                page::settle(self.config.settle).await;
                discovery::read_pending_field(page, log).await.len()
            }
            DiscoveryStrategy::CalendarScan => {
                let mut remaining = 0;
                for window in discovery::month_windows(today, months_back) {
                    let url = day::listing_url(&self.portal_url, &window.probe);
                    remaining += discovery::scan_month(page, &url, &window, self.config.settle, log)
                        .await
                        .len();
                }
                remaining
            }
        };

        if remaining > 0 {
            log.warning(format!(
                "{remaining} pending day(s) still present after the run"
            ));
        } else {
            log.info("final verification: no pending days remain");
        }
        log.progress(100);
    }
}
