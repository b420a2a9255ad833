//! # capataz
//!
//! Unattended validation of pending worker time entries on a legacy,
//! template-driven timesheet portal. One run logs in, discovers which
//! calendar days still have unapproved entries, validates them job site
//! by job site (confirming the portal's modal dialogs), re-verifies, and
//! reports a structured summary plus an audit-log stream.
//!
//! Drives a real browser over the Chrome DevTools Protocol; the
//! portal's client-side behavior is too entangled for plain HTTP.

pub mod browser;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod report;
pub mod telemetry;
