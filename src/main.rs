//! eex-export: nonavailability event export from the EEX transparency platform.
//!
//! Fetches every event updated between `--start` and `--end` for one company, audits
//! each event's version lineage, and writes a run directory below the export root:
//!
//! ```bash
//! # Credentials and endpoint from .env / environment
//! export EEX_API_BASE_URL=https://api.example.com
//! export EEX_API_EVENT_PATH=/pub/transparency/events
//! export EEX_API_USERNAME=... EEX_API_PASSWORD=...
//!
//! # Export everything since 2014 for the default company
//! eex-export --export-root ./export
//!
//! # One row per logical event, newest version only
//! eex-export --company-id EON_EnergyDE --start 2020-01-01T00:00:00Z --latest-only
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use eex_nonavailability::logging::init_logging;
use eex_nonavailability::{run, Args, RunSummary, Settings};
use eex_transport::EexClient;

fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    match execute(&args) {
        Ok(summary) => report(&summary),
        Err(e) => {
            error!("Something has gone terribly wrong: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn execute(args: &Args) -> Result<RunSummary> {
    let settings = Settings::resolve(args).context("Invalid configuration")?;
    let client = EexClient::new(settings.client_config());
    info!(
        "Exporting {} from {} via {}",
        settings.company_id,
        settings.start.to_rfc3339(),
        client.endpoint()
    );
    run(&settings, client)
}

fn report(summary: &RunSummary) {
    info!(
        "Fetched {} events in {} windows ({} logical events, {} unparseable identifiers)",
        summary.fetched,
        summary.windows.len(),
        summary.groups,
        summary.unparsed
    );
    info!("Found {} version anomalies", summary.anomalies);
    info!(
        "Wrote {} rows to {}",
        summary.exported,
        summary.export_path.display()
    );
    info!("Statistics written to {}", summary.statistics_path.display());
}
