//! EEX Nonavailability Exporter
//!
//! Batch export of nonavailability events from the EEX transparency platform:
//!
//! - **Pagination**: walk an update range in windows of at most one year
//!   ([`pagination`]), one retried, fail-soft query per window
//! - **Reconciliation**: group revisions by logical event and audit each version
//!   lineage for duplicates and gaps ([`reconcile`])
//! - **Export**: `;`-delimited CSV plus a chronological statistics log per run
//!   ([`export`], [`run_log`])
//!
//! See [`runner::run`] for the end-to-end flow and [`config::Settings`] for
//! configuration.

pub mod args;
pub mod config;
pub mod export;
pub mod logging;
pub mod pagination;
pub mod reconcile;
pub mod run_log;
pub mod runner;

pub use args::{Args, ExportMode};
pub use config::Settings;
pub use reconcile::{reconcile, Anomaly, AnomalyKind, Reconciliation};
pub use runner::{run, RunSummary};
