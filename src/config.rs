//! Run settings.
//!
//! [`Settings`] is resolved once at startup from `EEX_API_*` environment variables and
//! CLI overrides, validated, and then passed by reference to every stage. Nothing reads
//! the environment after that point.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use eex_transport::source::NONAVAILABILITY_SYMBOL;
use eex_transport::EexClientConfig;
use eex_types::env_utils::{env_bool_or, env_parse_or, env_string, env_string_or};
use eex_types::RetryConfig;

use crate::args::{Args, ExportMode};

pub const DEFAULT_COMPANY_ID: &str = "EON_EnergyDE";
pub const DEFAULT_START: &str = "2014-01-01T00:00:00Z";
pub const DEFAULT_EXPORT_ROOT: &str = "export";
pub const DEFAULT_EXPORT_TIMEZONE: Tz = chrono_tz::Europe::Berlin;

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub event_path: String,
    pub username: String,
    pub password: String,
    pub export_root: PathBuf,
    pub company_id: String,
    pub symbol: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub retry: RetryConfig,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub export_timezone: Tz,
    pub export_mode: ExportMode,
}

impl Settings {
    /// Read settings from the environment alone.
    pub fn from_env() -> Result<Self> {
        let start = parse_datetime(&env_string_or("EEX_API_START", DEFAULT_START))
            .context("EEX_API_START")?;
        let end = match env_string("EEX_API_END") {
            Some(v) => parse_datetime(&v).context("EEX_API_END")?,
            None => Utc::now().fixed_offset(),
        };
        let export_timezone = match env_string("EEX_API_EXPORT_TIMEZONE") {
            Some(v) => parse_timezone(&v).context("EEX_API_EXPORT_TIMEZONE")?,
            None => DEFAULT_EXPORT_TIMEZONE,
        };

        Ok(Self {
            base_url: env_string_or("EEX_API_BASE_URL", ""),
            event_path: env_string_or("EEX_API_EVENT_PATH", ""),
            username: env_string_or("EEX_API_USERNAME", ""),
            password: env_string_or("EEX_API_PASSWORD", ""),
            export_root: PathBuf::from(env_string_or(
                "EEX_API_CSV_EXPORT_PATH",
                DEFAULT_EXPORT_ROOT,
            )),
            company_id: env_string_or("EEX_API_COMPANY_ID", DEFAULT_COMPANY_ID),
            symbol: env_string_or("EEX_API_SYMBOL", NONAVAILABILITY_SYMBOL),
            start,
            end,
            retry: RetryConfig::new(
                env_number("EEX_API_RETRY_ATTEMPTS", 5)?,
                env_number("EEX_API_RETRY_DELAY_SECS", 15)?,
            ),
            connect_timeout: Duration::from_secs(env_number("EEX_API_CONNECT_TIMEOUT_SECS", 10)?),
            read_timeout: Duration::from_secs(env_number("EEX_API_READ_TIMEOUT_SECS", 60)?),
            export_timezone,
            export_mode: if env_bool_or("EEX_API_LATEST_ONLY", false) {
                ExportMode::Latest
            } else {
                ExportMode::All
            },
        })
    }

    /// Environment settings with CLI overrides applied, validated.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut settings = Self::from_env()?;
        settings.apply_args(args)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_args(&mut self, args: &Args) -> Result<()> {
        if let Some(v) = &args.company_id {
            self.company_id = v.clone();
        }
        if let Some(v) = &args.start {
            self.start = parse_datetime(v).context("--start")?;
        }
        if let Some(v) = &args.end {
            self.end = parse_datetime(v).context("--end")?;
        }
        if let Some(v) = &args.export_root {
            self.export_root = v.clone();
        }
        if let Some(v) = &args.base_url {
            self.base_url = v.clone();
        }
        if let Some(v) = &args.event_path {
            self.event_path = v.clone();
        }
        if let Some(v) = &args.symbol {
            self.symbol = v.clone();
        }
        if let Some(v) = args.retry_attempts {
            self.retry.max_attempts = v;
        }
        if let Some(v) = args.retry_delay_secs {
            self.retry.delay = Duration::from_secs(v);
        }
        if let Some(v) = &args.export_timezone {
            self.export_timezone = parse_timezone(v).context("--export-timezone")?;
        }
        if let Some(mode) = args.effective_export_mode() {
            self.export_mode = mode;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            bail!("no API base URL configured (set EEX_API_BASE_URL or --base-url)");
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("API base URL must start with http:// or https://: {}", self.base_url);
        }
        if self.company_id.is_empty() {
            bail!("company id must not be empty");
        }
        if self.start >= self.end {
            bail!(
                "start {} must be before end {}",
                self.start.to_rfc3339(),
                self.end.to_rfc3339()
            );
        }
        Ok(())
    }

    pub fn client_config(&self) -> EexClientConfig {
        EexClientConfig {
            base_url: self.base_url.clone(),
            event_path: self.event_path.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
        }
    }
}

pub fn parse_datetime(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| anyhow!("invalid RFC 3339 datetime '{}': {}", value, e))
}

/// Numeric environment setting; a malformed value is an error like a malformed date.
fn env_number<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_parse_or(key, default).with_context(|| format!("invalid {}", key))
}

pub fn parse_timezone(value: &str) -> Result<Tz> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|e| anyhow!("unknown timezone '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn settings() -> Settings {
        Settings {
            base_url: "https://api.example.com".to_string(),
            event_path: "/events".to_string(),
            username: String::new(),
            password: String::new(),
            export_root: PathBuf::from(DEFAULT_EXPORT_ROOT),
            company_id: DEFAULT_COMPANY_ID.to_string(),
            symbol: NONAVAILABILITY_SYMBOL.to_string(),
            start: parse_datetime("2014-01-01T00:00:00Z").unwrap(),
            end: parse_datetime("2020-01-01T00:00:00Z").unwrap(),
            retry: RetryConfig::default(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            export_timezone: DEFAULT_EXPORT_TIMEZONE,
            export_mode: ExportMode::All,
        }
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_base_url() {
        let mut s = settings();
        s.base_url = String::new();
        assert!(s.validate().is_err());

        s.base_url = "ftp://api.example.com".to_string();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut s = settings();
        s.end = s.start;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_apply_args_overrides() {
        let mut s = settings();
        let args = Args::parse_from([
            "eex-export",
            "--company-id",
            "RWE",
            "--end",
            "2016-07-01T00:00:00+02:00",
            "--retry-attempts",
            "2",
            "--retry-delay-secs",
            "1",
            "--export-timezone",
            "UTC",
            "--latest-only",
        ]);
        s.apply_args(&args).unwrap();

        assert_eq!(s.company_id, "RWE");
        assert_eq!(s.end.offset().local_minus_utc(), 7200);
        assert_eq!(s.retry, RetryConfig::new(2, 1));
        assert_eq!(s.export_timezone, chrono_tz::UTC);
        assert_eq!(s.export_mode, ExportMode::Latest);
    }

    #[test]
    fn test_apply_args_rejects_bad_values() {
        let mut s = settings();
        let args = Args::parse_from(["eex-export", "--start", "2014-01-01"]);
        assert!(s.apply_args(&args).is_err());

        let args = Args::parse_from(["eex-export", "--export-timezone", "Mars/Olympus"]);
        assert!(s.apply_args(&args).is_err());
    }

    #[test]
    fn test_malformed_numeric_env_is_an_error() {
        std::env::set_var("EEX_TEST_CONFIG_TIMEOUT_BAD", "ten");
        let err = env_number::<u64>("EEX_TEST_CONFIG_TIMEOUT_BAD", 10).unwrap_err();
        assert!(format!("{:#}", err).contains("EEX_TEST_CONFIG_TIMEOUT_BAD"));
        std::env::remove_var("EEX_TEST_CONFIG_TIMEOUT_BAD");

        assert_eq!(env_number::<u64>("EEX_TEST_CONFIG_TIMEOUT_UNSET", 10).unwrap(), 10);
    }

    #[test]
    fn test_client_config_carries_timeouts() {
        let cfg = settings().client_config();
        assert_eq!(cfg.base_url, "https://api.example.com");
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
        assert_eq!(cfg.read_timeout, Duration::from_secs(60));
    }
}
