//! Chronological run statistics, flushed to `statistics.log` at the end of a run.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use std::io::Write;

/// Timestamp prefix of every statistics line.
pub const LINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Format for dates inside statistics messages.
pub const MESSAGE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Append-only list of timestamped statistics lines.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message`, stamped with the current local time.
    pub fn record(&mut self, message: impl AsRef<str>) {
        self.record_at(Local::now(), message);
    }

    pub fn record_at(&mut self, at: DateTime<Local>, message: impl AsRef<str>) {
        self.lines
            .push(format!("{}: {}", at.format(LINE_TIME_FORMAT), message.as_ref()));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Write every line newline-terminated, flushing after each one.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for line in &self.lines {
            writer
                .write_all(line.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .and_then(|_| writer.flush())
                .context("Failed to write statistics line")?;
        }
        Ok(())
    }
}

/// Render a datetime in its own offset for statistics messages.
pub fn message_time<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format(MESSAGE_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_record_prefixes_local_timestamp() {
        let at = Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2020, 11, 19)
                    .unwrap()
                    .and_hms_milli_opt(8, 5, 3, 42)
                    .unwrap(),
            )
            .unwrap();
        let mut log = RunLog::new();
        log.record_at(at, "Found 3 events");
        assert_eq!(log.lines(), ["2020-11-19 08:05:03.042: Found 3 events"]);
    }

    #[test]
    fn test_write_to_terminates_every_line() {
        let mut log = RunLog::new();
        log.record("first");
        log.record("second");

        let mut out = Vec::new();
        log.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("second\n"));
        assert!(text.lines().next().unwrap().ends_with(": first"));
    }
}
