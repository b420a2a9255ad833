//! Authenticator: drive the portal's credential form.

use std::time::{Duration, Instant};

use chromiumoxide::page::Page;
use secrecy::ExposeSecret;

use crate::browser::page::{self, clear_and_type, current_url, wait_for_visible};
use crate::config::Credentials;
use crate::engine::markers;
use crate::error::{Error, Result};
use crate::report::RunLog;

/// How long the credential form gets to appear before the run concludes
/// the portal never served it.
const FORM_TIMEOUT: Duration = Duration::from_secs(20);
/// How long submission gets to either redirect into the application or
/// surface the portal's own error banner.
const OUTCOME_TIMEOUT: Duration = Duration::from_secs(30);
const OUTCOME_POLL: Duration = Duration::from_millis(500);

/// Log in, or confirm the session is already warm.
///
/// Against a long-lived shared browser the previous run's session is
/// often still valid; landing directly inside the application is the
/// common case and short-circuits without touching the form.
pub async fn login(
    page: &Page,
    portal_url: &str,
    credentials: &Credentials,
    log: &RunLog<'_>,
) -> Result<()> {
    page::goto(page, portal_url).await?;

    let landed = current_url(page).await?;
    if is_authenticated_url(&landed, portal_url) {
        log.info("session already active, skipping login");
        return Ok(());
    }

    let username_field = form_field(page, markers::USERNAME_SELECTOR).await?;
    let password_field = form_field(page, markers::PASSWORD_SELECTOR).await?;

    clear_and_type(&username_field, &credentials.username).await?;
    clear_and_type(&password_field, credentials.password.expose_secret()).await?;

    log.info(format!("submitting credentials for {}", credentials.username));
    let submit = form_field(page, markers::LOGIN_SUBMIT_SELECTOR).await?;
    submit.click().await?;

    wait_for_outcome(page, portal_url, log).await
}

/// A login-form control; its absence means the form never appeared.
async fn form_field(page: &Page, selector: &str) -> Result<chromiumoxide::element::Element> {
    wait_for_visible(page, selector, FORM_TIMEOUT)
        .await
        .map_err(|e| match e {
            Error::WaitTimeout { .. } => Error::LoginFormNotFound,
            other => other,
        })
}

/// Race the success redirect against the portal's error banner. On
/// timeout the banner is what turns a mute failure into an actionable
/// message.
async fn wait_for_outcome(page: &Page, portal_url: &str, log: &RunLog<'_>) -> Result<()> {
    let started = Instant::now();
    loop {
        let url = current_url(page).await?;
        if is_authenticated_url(&url, portal_url) {
            log.success("login completed");
            return Ok(());
        }

        if let Ok(banners) = page.find_elements(markers::LOGIN_ERROR_SELECTOR).await {
            for banner in banners {
                if page::is_visible(&banner).await {
                    let message = banner
                        .inner_text()
                        .await
                        .ok()
                        .flatten()
                        .map(|t| markers::collapse_label(&t, 160))
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| "credentials rejected".to_string());
                    return Err(Error::InvalidCredentials(message));
                }
            }
        }

        if started.elapsed() >= OUTCOME_TIMEOUT {
            return Err(Error::LoginTimeout);
        }
        tokio::time::sleep(OUTCOME_POLL).await;
    }
}

/// Whether `url` is inside the authenticated application rather than on
/// the identity provider.
pub fn is_authenticated_url(url: &str, portal_url: &str) -> bool {
    let host = host_of(url);
    if host.is_empty() || host != host_of(portal_url) {
        // A different host mid-login is the identity provider.
        return false;
    }
    if markers::IDENTITY_HOST_MARKERS
        .iter()
        .any(|m| host.starts_with(m))
    {
        return false;
    }
    let path = path_of(url).to_lowercase();
    !markers::IDENTITY_PATH_MARKERS
        .iter()
        .any(|m| path.starts_with(m))
}

fn host_of(url: &str) -> String {
    let rest = url.split("://").nth(1).unwrap_or(url);
    rest.split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .to_lowercase()
}

fn path_of(url: &str) -> &str {
    let rest = url.split("://").nth(1).unwrap_or(url);
    match rest.find('/') {
        Some(idx) => {
            let path = &rest[idx..];
            path.split(['?', '#']).next().unwrap_or(path)
        }
        None => "/",
    }
}
