//! End-to-end export run.
//!
//! Fetch, reconcile and export happen strictly in sequence on the calling thread.
//! Window failures are absorbed by the fetcher; anything returned as `Err` from here
//! aborts the run. Files already written at that point stay on disk.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::Instant;

use eex_transport::{EventSource, WindowFetcher};

use crate::config::Settings;
use crate::export::{run_directory, write_export_file, write_statistics_file};
use crate::pagination::{PaginationDriver, WindowStats};
use crate::reconcile::reconcile;
use crate::run_log::{message_time, RunLog};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub windows: Vec<WindowStats>,
    pub fetched: usize,
    pub exported: usize,
    pub groups: usize,
    pub unparsed: usize,
    pub anomalies: usize,
    pub run_dir: PathBuf,
    pub export_path: PathBuf,
    pub statistics_path: PathBuf,
    pub statistics: RunLog,
}

/// Run the full export against `source`.
pub fn run<S: EventSource>(settings: &Settings, source: S) -> Result<RunSummary> {
    let fetcher = WindowFetcher::new(source, settings.retry).with_symbol(settings.symbol.clone());
    run_with_fetcher(settings, fetcher, Local::now)
}

/// Run the full export with a prepared fetcher.
///
/// `clock` supplies the local time used to name the run directory once fetching and
/// reconciliation are done.
pub fn run_with_fetcher<S, C>(
    settings: &Settings,
    fetcher: WindowFetcher<S>,
    clock: C,
) -> Result<RunSummary>
where
    S: EventSource,
    C: FnOnce() -> DateTime<Local>,
{
    let started = Instant::now();
    let mut statistics = RunLog::new();

    statistics.record(format!(
        "Start export of {} from {} to {}",
        settings.company_id,
        message_time(&settings.start),
        message_time(&settings.end)
    ));

    let driver = PaginationDriver::new(fetcher);
    let pagination = driver.fetch_all(
        &settings.company_id,
        settings.start,
        settings.end,
        &mut statistics,
    );
    let fetched = pagination.events.len();

    statistics.record(format!(
        "Loading of {} from {} to {} took {}ms",
        fetched,
        message_time(&settings.start),
        message_time(&settings.end),
        started.elapsed().as_millis()
    ));

    let reconciliation = reconcile(pagination.events);
    reconciliation.record_anomalies(&mut statistics);

    let run_dir = run_directory(&settings.export_root, clock());
    let (export_path, exported) = write_export_file(
        &run_dir,
        &reconciliation,
        settings.export_mode,
        settings.export_timezone,
    )?;
    let statistics_path = write_statistics_file(&run_dir, &statistics)?;

    Ok(RunSummary {
        windows: pagination.windows,
        fetched,
        exported,
        groups: reconciliation.group_count(),
        unparsed: reconciliation.unparsed,
        anomalies: reconciliation.anomalies.len(),
        run_dir,
        export_path,
        statistics_path,
        statistics,
    })
}
