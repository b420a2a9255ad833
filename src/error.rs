//! Error types for capataz.
//!
//! Two classes. Fatal errors (browser acquisition, login) abort the whole
//! run; no amount of retrying fixes bad credentials or a missing form.
//! Everything else is caught at the narrowest applicable scope and turned
//! into a log entry plus a degraded-but-valid result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No usable browser endpoint or process within the acquisition timeout.
    #[error("no usable browser: {0}")]
    BrowserUnavailable(String),

    /// The credential form never appeared.
    #[error("login form did not appear")]
    LoginFormNotFound,

    /// The portal surfaced its own error banner after submission.
    #[error("portal rejected credentials: {0}")]
    InvalidCredentials(String),

    /// Neither success redirect nor error banner within the login window.
    #[error("login neither completed nor failed in time")]
    LoginTimeout,

    /// A validation page has selectable entries but no submit control.
    /// Escalates to the day retry loop; unlike a missing confirmation
    /// dialog, this is not safely ignorable.
    #[error("submit control missing on validation page")]
    SubmitButtonMissing,

    /// A bounded selector wait ran out. The one outcome optional-dialog
    /// handling is allowed to absorb.
    #[error("timed out after {waited_ms}ms waiting for `{selector}`")]
    WaitTimeout { selector: String, waited_ms: u64 },

    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error aborts the run outright.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::BrowserUnavailable(_)
                | Error::LoginFormNotFound
                | Error::InvalidCredentials(_)
                | Error::LoginTimeout
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_browser_and_login_failures_are_fatal() {
        assert!(Error::BrowserUnavailable("no endpoint".to_string()).is_fatal());
        assert!(Error::LoginFormNotFound.is_fatal());
        assert!(Error::InvalidCredentials("bad password".to_string()).is_fatal());
        assert!(Error::LoginTimeout.is_fatal());

        assert!(!Error::SubmitButtonMissing.is_fatal());
        assert!(
            !Error::WaitTimeout {
                selector: "#x".to_string(),
                waited_ms: 4000,
            }
            .is_fatal()
        );
        assert!(!Error::Other("anything else".to_string()).is_fatal());
    }
}
