//! Tracing initialization.
//!
//! Structured diagnostics for operators tailing the process. The
//! audit-log stream the surrounding system consumes is separate; see
//! [`crate::report`].

use crate::error::{Error, Result};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the given default
/// level applies.
///
/// # Errors
///
/// Returns an error if a subscriber was already installed.
pub fn init_telemetry(default_level: &str) -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Other(format!("failed to init tracing subscriber: {e}")))
}
