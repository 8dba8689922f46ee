//! CSV export and statistics file output.
//!
//! Each run writes into its own directory below the export root:
//!
//! ```text
//! {export_root}/{yyyy-MM-dd_HH-mm-ss}/export.csv
//! {export_root}/{yyyy-MM-dd_HH-mm-ss}/statistics.log
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use chrono_tz::Tz;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

use eex_types::Event;

use crate::args::ExportMode;
use crate::reconcile::Reconciliation;
use crate::run_log::RunLog;

pub const EXPORT_FILE_NAME: &str = "export.csv";
pub const STATISTICS_FILE_NAME: &str = "statistics.log";
pub const RUN_DIR_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
pub const EXPORT_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";
pub const CSV_DELIMITER: u8 = b';';

pub const EXPORT_HEADER: [&str; 12] = [
    "EventID",
    "Count",
    "UnitID",
    "Country",
    "CompanyID",
    "Timestamp",
    "Modification",
    "Publication",
    "Startdate",
    "Enddate",
    "Capacity",
    "Status",
];

/// Display projection of one event, column order matching [`EXPORT_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub event_id: String,
    pub count: String,
    pub unit_id: String,
    pub country: String,
    pub company_id: String,
    pub timestamp: String,
    pub modification: String,
    pub publication: String,
    pub start: String,
    pub end: String,
    pub capacity: String,
    pub status: String,
}

impl ExportRow {
    /// Project `event`, rendering every timestamp in `tz`.
    ///
    /// Events without a decoded identity get empty EventID and Count cells.
    pub fn from_event(event: &Event, tz: Tz) -> Self {
        let raw = event.raw();
        Self {
            event_id: event.logical_id().unwrap_or_default().to_string(),
            count: event.version().map(|v| v.to_string()).unwrap_or_default(),
            unit_id: raw.unit_id.clone(),
            country: raw.country.clone(),
            company_id: raw.company_id.clone(),
            timestamp: format_in_zone(raw.timestamp.as_ref(), tz),
            modification: format_in_zone(raw.modification.as_ref(), tz),
            publication: format_in_zone(raw.publication.as_ref(), tz),
            start: format_in_zone(raw.start.as_ref(), tz),
            end: format_in_zone(raw.end.as_ref(), tz),
            capacity: raw.capacity.clone(),
            status: raw.status.clone(),
        }
    }
}

/// Render `dt` converted to `tz`; missing timestamps render empty.
pub fn format_in_zone(dt: Option<&DateTime<FixedOffset>>, tz: Tz) -> String {
    dt.map(|dt| dt.with_timezone(&tz).format(EXPORT_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// Records selected for export under `mode`, in fetch order.
pub fn select_events(reconciliation: &Reconciliation, mode: ExportMode) -> Vec<&Event> {
    match mode {
        ExportMode::All => reconciliation.events.iter().collect(),
        ExportMode::Latest => reconciliation.latest_events(),
    }
}

/// Write header and rows as `;`-delimited CSV. Returns the number of data rows.
pub fn write_csv<W: Write>(writer: W, events: &[&Event], tz: Tz) -> Result<usize> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .has_headers(false)
        .from_writer(writer);

    csv.write_record(EXPORT_HEADER)
        .context("Failed to write CSV header")?;
    for event in events {
        csv.serialize(ExportRow::from_event(event, tz))
            .with_context(|| format!("Failed to write CSV row for {}", event.raw().event_id))?;
    }
    csv.flush().context("Failed to flush CSV export")?;
    Ok(events.len())
}

/// Directory for the run started at `at`.
pub fn run_directory(export_root: &Path, at: DateTime<Local>) -> PathBuf {
    export_root.join(at.format(RUN_DIR_FORMAT).to_string())
}

/// Create `dir` if needed and open `file_name` in it for writing.
pub fn prepare_file(dir: &Path, file_name: &str) -> Result<BufWriter<File>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow!("Failed to create directory {}: {}", dir.display(), e))?;
    let path = dir.join(file_name);
    let file = File::create(&path)
        .map_err(|e| anyhow!("Failed to create {}: {}", path.display(), e))?;
    Ok(BufWriter::new(file))
}

/// Write `export.csv` into `run_dir`. Returns the file path and the number of rows.
pub fn write_export_file(
    run_dir: &Path,
    reconciliation: &Reconciliation,
    mode: ExportMode,
    tz: Tz,
) -> Result<(PathBuf, usize)> {
    let started = Instant::now();
    let events = select_events(reconciliation, mode);
    debug!("Starting CSV Export of {} events", events.len());

    let writer = prepare_file(run_dir, EXPORT_FILE_NAME)?;
    let rows = write_csv(writer, &events, tz)?;

    debug!("Export took {}ms", started.elapsed().as_millis());
    Ok((run_dir.join(EXPORT_FILE_NAME), rows))
}

/// Write `statistics.log` into `run_dir`.
pub fn write_statistics_file(run_dir: &Path, log: &RunLog) -> Result<PathBuf> {
    let mut writer = prepare_file(run_dir, STATISTICS_FILE_NAME)?;
    log.write_to(&mut writer)?;
    Ok(run_dir.join(STATISTICS_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;
    use chrono::{NaiveDate, TimeZone};
    use eex_types::RawEvent;

    fn event(event_id: &str) -> RawEvent {
        RawEvent {
            event_id: event_id.to_string(),
            capacity: "1345,5".to_string(),
            company_id: "EON_EnergyDE".to_string(),
            country: "DE".to_string(),
            unit_id: "UNIT1".to_string(),
            status: "Active".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2020-11-19T10:00:00Z").ok(),
            start: DateTime::parse_from_rfc3339("2020-07-01T22:00:00Z").ok(),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_in_zone_converts_instant() {
        let winter = DateTime::parse_from_rfc3339("2020-11-19T10:00:00Z").unwrap();
        let summer = DateTime::parse_from_rfc3339("2020-07-01T22:00:00+00:00").unwrap();
        let berlin = chrono_tz::Europe::Berlin;
        assert_eq!(format_in_zone(Some(&winter), berlin), "19.11.2020 11:00:00");
        assert_eq!(format_in_zone(Some(&summer), berlin), "02.07.2020 00:00:00");
        assert_eq!(format_in_zone(None, berlin), "");
    }

    #[test]
    fn test_row_projection() {
        let reconciliation = reconcile(vec![event("0012#034_0007")]);
        let row = ExportRow::from_event(&reconciliation.events[0], chrono_tz::Europe::Berlin);
        assert_eq!(row.event_id, "12#034");
        assert_eq!(row.count, "7");
        assert_eq!(row.capacity, "1345,5");
        assert_eq!(row.timestamp, "19.11.2020 11:00:00");
        assert_eq!(row.modification, "");
    }

    #[test]
    fn test_unparsed_event_has_empty_identity_cells() {
        let reconciliation = reconcile(vec![event("broken")]);
        let row = ExportRow::from_event(&reconciliation.events[0], chrono_tz::UTC);
        assert_eq!(row.event_id, "");
        assert_eq!(row.count, "");
        assert_eq!(row.unit_id, "UNIT1");
    }

    #[test]
    fn test_write_csv_header_and_delimiter() {
        let reconciliation = reconcile(vec![event("1#A_1"), event("1#A_2")]);
        let events = select_events(&reconciliation, ExportMode::All);

        let mut out = Vec::new();
        let rows = write_csv(&mut out, &events, chrono_tz::UTC).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(rows, 2);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "EventID;Count;UnitID;Country;CompanyID;Timestamp;Modification;Publication;Startdate;Enddate;Capacity;Status"
        );
        assert_eq!(
            lines[1],
            "1#A;1;UNIT1;DE;EON_EnergyDE;19.11.2020 10:00:00;;;01.07.2020 22:00:00;;1345,5;Active"
        );
    }

    #[test]
    fn test_write_csv_without_events_still_has_header() {
        let mut out = Vec::new();
        let rows = write_csv(&mut out, &[], chrono_tz::UTC).unwrap();
        assert_eq!(rows, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_select_latest_only() {
        let reconciliation = reconcile(vec![
            event("1#A_1"),
            event("broken"),
            event("1#A_2"),
            event("2#B_1"),
        ]);
        assert_eq!(select_events(&reconciliation, ExportMode::All).len(), 4);

        let latest = select_events(&reconciliation, ExportMode::Latest);
        let ids: Vec<_> = latest.iter().map(|e| e.raw().event_id.as_str()).collect();
        assert_eq!(ids, vec!["1#A_2", "2#B_1"]);
    }

    #[test]
    fn test_run_directory_naming() {
        let at = Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2020, 11, 19)
                    .unwrap()
                    .and_hms_opt(8, 5, 3)
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            run_directory(Path::new("/data/eex"), at),
            PathBuf::from("/data/eex/2020-11-19_08-05-03")
        );
    }

    #[test]
    fn test_files_are_written_into_run_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let run_dir = tmp.path().join("nested").join("2020-11-19_08-05-03");
        let reconciliation = reconcile(vec![event("1#A_1")]);

        let (export_path, rows) =
            write_export_file(&run_dir, &reconciliation, ExportMode::All, chrono_tz::UTC).unwrap();
        assert_eq!(rows, 1);
        assert_eq!(export_path, run_dir.join("export.csv"));

        let mut log = RunLog::new();
        log.record("one");
        log.record("two");
        let stats_path = write_statistics_file(&run_dir, &log).unwrap();

        let stats = std::fs::read_to_string(stats_path).unwrap();
        assert_eq!(stats.lines().count(), 2);
        let csv = std::fs::read_to_string(export_path).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
