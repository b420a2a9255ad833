//! Configuration loading. One test function: env vars are process-global
//! and the test harness runs in parallel, so the phases run sequentially
//! here instead of racing each other.

use capataz::config::{BrowserStrategy, Config};

#[test]
fn config_loads_from_env_and_fails_without_required_vars() {
    // Missing required vars; must fail fast.
    unsafe {
        std::env::remove_var("CAPATAZ_PORTAL_URL");
        std::env::remove_var("CAPATAZ_USERNAME");
        std::env::remove_var("CAPATAZ_PASSWORD");
        std::env::remove_var("CAPATAZ_BROWSER_WS");
        std::env::remove_var("CAPATAZ_MONTHS_BACK");
    }
    assert!(Config::from_env().is_err());

    // All required vars present; launch strategy by default, trailing
    // slash trimmed, months_back defaulted.
    unsafe {
        std::env::set_var("CAPATAZ_PORTAL_URL", "https://obras.ejemplo.com/");
        std::env::set_var("CAPATAZ_USERNAME", "capataz01");
        std::env::set_var("CAPATAZ_PASSWORD", "hunter2");
    }
    let config = Config::from_env().expect("config should load");
    assert_eq!(config.portal_url, "https://obras.ejemplo.com");
    assert_eq!(config.credentials.username, "capataz01");
    assert_eq!(config.months_back, 1);
    assert!(matches!(
        config.browser,
        BrowserStrategy::Launch { headless: true }
    ));

    // Websocket endpoint switches to the attach strategy; months_back is
    // clamped to at least 1.
    unsafe {
        std::env::set_var("CAPATAZ_BROWSER_WS", "ws://127.0.0.1:9222/devtools/browser/abc");
        std::env::set_var("CAPATAZ_MONTHS_BACK", "0");
    }
    let config = Config::from_env().expect("config should load");
    assert!(matches!(config.browser, BrowserStrategy::Attach { .. }));
    assert_eq!(config.months_back, 1);

    // Non-numeric months_back is a configuration error.
    unsafe {
        std::env::set_var("CAPATAZ_MONTHS_BACK", "two");
    }
    assert!(Config::from_env().is_err());

    // Clean up.
    unsafe {
        std::env::remove_var("CAPATAZ_PORTAL_URL");
        std::env::remove_var("CAPATAZ_USERNAME");
        std::env::remove_var("CAPATAZ_PASSWORD");
        std::env::remove_var("CAPATAZ_BROWSER_WS");
        std::env::remove_var("CAPATAZ_MONTHS_BACK");
    }
}
