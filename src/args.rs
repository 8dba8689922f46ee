use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which fetched records end up in `export.csv`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportMode {
    /// Every fetched record, in fetch order.
    #[default]
    All,
    /// Only the highest version of each logical event.
    Latest,
}

#[derive(Debug, Parser)]
#[command(
    name = "eex-export",
    author,
    version,
    about = "Export EEX transparency nonavailability events to CSV",
    long_about = "Fetches nonavailability events year by year from the EEX transparency API,\n\
                  audits each event's version lineage, and writes export.csv plus\n\
                  statistics.log into a timestamped run directory.\n\n\
                  Every option falls back to its EEX_API_* environment variable (a .env file\n\
                  is honoured). Credentials are only read from the environment."
)]
pub struct Args {
    /// Company whose events are exported [env: EEX_API_COMPANY_ID, default: EON_EnergyDE]
    #[arg(long, value_name = "ID")]
    pub company_id: Option<String>,

    /// Start of the update range, RFC 3339 [env: EEX_API_START, default: 2014-01-01T00:00:00Z]
    #[arg(long, value_name = "DATETIME")]
    pub start: Option<String>,

    /// End of the update range, RFC 3339 [env: EEX_API_END, default: now]
    #[arg(long, value_name = "DATETIME")]
    pub end: Option<String>,

    /// Root directory for run directories [env: EEX_API_CSV_EXPORT_PATH, default: export]
    #[arg(long, value_name = "DIR")]
    pub export_root: Option<PathBuf>,

    /// API base URL [env: EEX_API_BASE_URL]
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Event endpoint path below the base URL [env: EEX_API_EVENT_PATH]
    #[arg(long, value_name = "PATH")]
    pub event_path: Option<String>,

    /// Symbol filter sent with every query [env: EEX_API_SYMBOL]
    #[arg(long, value_name = "SYMBOL")]
    pub symbol: Option<String>,

    /// Total attempts per window while the service is unavailable [env: EEX_API_RETRY_ATTEMPTS]
    #[arg(long, value_name = "N")]
    pub retry_attempts: Option<u32>,

    /// Fixed delay between attempts in seconds [env: EEX_API_RETRY_DELAY_SECS]
    #[arg(long, value_name = "SECS")]
    pub retry_delay_secs: Option<u64>,

    /// IANA timezone for exported timestamps [env: EEX_API_EXPORT_TIMEZONE, default: Europe/Berlin]
    #[arg(long, value_name = "TZ")]
    pub export_timezone: Option<String>,

    /// Which records to write to export.csv [env: EEX_API_LATEST_ONLY, default: all]
    #[arg(long, value_enum)]
    pub export_mode: Option<ExportMode>,

    /// Shorthand for `--export-mode latest`
    #[arg(long, default_value_t = false, conflicts_with = "export_mode")]
    pub latest_only: bool,

    /// Verbose output (debug logging for this crate)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Export mode requested on the command line, if any.
    pub fn effective_export_mode(&self) -> Option<ExportMode> {
        if self.latest_only {
            Some(ExportMode::Latest)
        } else {
            self.export_mode
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_overrides_unset() {
        let args = Args::parse_from(["eex-export"]);
        assert!(args.company_id.is_none());
        assert!(args.start.is_none());
        assert_eq!(args.effective_export_mode(), None);
        assert!(!args.verbose);
    }

    #[test]
    fn test_latest_only_shorthand() {
        let args = Args::parse_from(["eex-export", "--latest-only"]);
        assert_eq!(args.effective_export_mode(), Some(ExportMode::Latest));

        let args = Args::parse_from(["eex-export", "--export-mode", "latest"]);
        assert_eq!(args.effective_export_mode(), Some(ExportMode::Latest));

        let args = Args::parse_from(["eex-export", "--export-mode", "all"]);
        assert_eq!(args.effective_export_mode(), Some(ExportMode::All));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let args = Args::parse_from([
            "eex-export",
            "--company-id",
            "RWE",
            "--start",
            "2020-01-01T00:00:00Z",
            "--retry-attempts",
            "3",
            "-v",
        ]);
        assert_eq!(args.company_id.as_deref(), Some("RWE"));
        assert_eq!(args.start.as_deref(), Some("2020-01-01T00:00:00Z"));
        assert_eq!(args.retry_attempts, Some(3));
        assert!(args.verbose);
    }
}
