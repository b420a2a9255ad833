//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The portal password is wrapped in secrecy::SecretString at load so it
//! cannot leak through Debug output or logs.

use secrecy::SecretString;

use crate::error::{Error, Result};

/// How a browser instance is obtained. Selected by configuration, never
/// re-derived at run time.
#[derive(Debug, Clone)]
pub enum BrowserStrategy {
    /// Attach to an already-running browser's remote-debugging websocket.
    /// The attached process is shared across runs and never closed here.
    Attach { endpoint: String },
    /// Launch a fresh, isolated process with sandboxing disabled; the
    /// usual deployment is an unprivileged container where the sandbox
    /// cannot start.
    Launch { headless: bool },
}

/// Portal credentials. The caller supplies them already decrypted; the
/// core never persists them and never logs the password.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct Config {
    /// Entry URL of the timesheet portal, without a trailing slash.
    pub portal_url: String,
    pub credentials: Credentials,
    pub browser: BrowserStrategy,
    /// Prior months to review in addition to the current one. At least 1.
    pub months_back: u32,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// `CAPATAZ_BROWSER_WS` selects the attach strategy; without it a
    /// dedicated browser is launched (`CAPATAZ_HEADLESS=0` to watch it).
    pub fn from_env() -> Result<Self> {
        let browser = match std::env::var("CAPATAZ_BROWSER_WS")
            .ok()
            .filter(|s| !s.is_empty())
        {
            Some(endpoint) => BrowserStrategy::Attach { endpoint },
            None => BrowserStrategy::Launch {
                headless: std::env::var("CAPATAZ_HEADLESS")
                    .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                    .unwrap_or(true),
            },
        };

        let months_back = match std::env::var("CAPATAZ_MONTHS_BACK") {
            Ok(raw) => raw
                .parse::<u32>()
                .map_err(|_| {
                    Error::Config(format!("CAPATAZ_MONTHS_BACK must be a number, got {raw:?}"))
                })?
                .max(1),
            Err(_) => 1,
        };

        Ok(Self {
            portal_url: required_var("CAPATAZ_PORTAL_URL")?
                .trim_end_matches('/')
                .to_string(),
            credentials: Credentials {
                username: required_var("CAPATAZ_USERNAME")?,
                password: SecretString::from(required_var("CAPATAZ_PASSWORD")?),
            },
            browser,
            months_back,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}
