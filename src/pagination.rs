//! Sequential year-by-year pagination over an update range.
//!
//! The remote API only answers bounded queries, so `[start, end)` is walked in windows
//! of at most one year. Windows are fetched strictly one after another; their statistics
//! therefore come out in temporal order.
//!
//! The walk stops once less than two whole seconds remain. Events updated in that last
//! slice are not fetched.

use chrono::{DateTime, FixedOffset, Months};
use std::time::{Duration, Instant};

use eex_transport::{EventSource, WindowFetcher};
use eex_types::RawEvent;

use crate::run_log::{message_time, RunLog};

/// One bounded query range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// End of the window starting at `start`: one calendar year later, capped at `overall_end`.
pub fn window_end(
    start: DateTime<FixedOffset>,
    overall_end: DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    start
        .checked_add_months(Months::new(12))
        .map_or(overall_end, |next| next.min(overall_end))
}

/// Iterator over the windows covering `[start, end)`.
#[derive(Debug, Clone)]
pub struct Windows {
    current_start: DateTime<FixedOffset>,
    overall_end: DateTime<FixedOffset>,
}

impl Windows {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            current_start: start,
            overall_end: end,
        }
    }
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if (self.overall_end - self.current_start).num_seconds() <= 1 {
            return None;
        }
        let window = Window {
            start: self.current_start,
            end: window_end(self.current_start, self.overall_end),
        };
        self.current_start = window.end;
        Some(window)
    }
}

/// Timing and size of one fetched window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStats {
    pub window: Window,
    pub count: usize,
    pub elapsed: Duration,
}

/// All records of a paginated fetch plus per-window statistics in fetch order.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub events: Vec<RawEvent>,
    pub windows: Vec<WindowStats>,
}

/// Drives a [`WindowFetcher`] across consecutive windows.
pub struct PaginationDriver<S> {
    fetcher: WindowFetcher<S>,
}

impl<S: EventSource> PaginationDriver<S> {
    pub fn new(fetcher: WindowFetcher<S>) -> Self {
        Self { fetcher }
    }

    /// Fetch every window of `[start, end)` for `company_id`, accumulating all records.
    ///
    /// A line per window is appended to `log`.
    pub fn fetch_all(
        &self,
        company_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        log: &mut RunLog,
    ) -> Pagination {
        let mut pagination = Pagination::default();

        for window in Windows::new(start, end) {
            let started = Instant::now();
            let events = self.fetcher.fetch(company_id, window.start, window.end);
            let elapsed = started.elapsed();

            log.record(format!(
                "Found {} from {} to {} in {}ms",
                events.len(),
                message_time(&window.start),
                message_time(&window.end),
                elapsed.as_millis()
            ));
            pagination.windows.push(WindowStats {
                window,
                count: events.len(),
                elapsed,
            });
            pagination.events.extend(events);
        }

        pagination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_datetime;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        parse_datetime(s).unwrap()
    }

    #[test]
    fn test_two_and_a_half_years_make_three_windows() {
        let windows: Vec<_> =
            Windows::new(ts("2014-01-01T00:00:00Z"), ts("2016-07-01T00:00:00Z")).collect();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, ts("2014-01-01T00:00:00Z"));
        assert_eq!(windows[0].end, ts("2015-01-01T00:00:00Z"));
        assert_eq!(windows[1].end, ts("2016-01-01T00:00:00Z"));
        assert_eq!(windows[2].start, ts("2016-01-01T00:00:00Z"));
        assert_eq!(windows[2].end, ts("2016-07-01T00:00:00Z"));
    }

    #[test]
    fn test_windows_are_contiguous() {
        let windows: Vec<_> =
            Windows::new(ts("2014-03-15T12:30:00Z"), ts("2020-11-19T08:00:00Z")).collect();
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for w in &windows {
            assert_eq!(w.end, window_end(w.start, ts("2020-11-19T08:00:00Z")));
        }
        assert_eq!(windows.last().unwrap().end, ts("2020-11-19T08:00:00Z"));
    }

    #[test]
    fn test_residual_of_one_second_is_not_fetched() {
        let end = ts("2015-01-01T00:00:01Z");
        let windows: Vec<_> = Windows::new(ts("2014-01-01T00:00:00Z"), end).collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end, ts("2015-01-01T00:00:00Z"));
    }

    #[test]
    fn test_residual_of_two_seconds_is_fetched() {
        let end = ts("2015-01-01T00:00:02Z");
        let windows: Vec<_> = Windows::new(ts("2014-01-01T00:00:00Z"), end).collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].end, end);
    }

    #[test]
    fn test_empty_or_inverted_range_has_no_windows() {
        let t = ts("2014-01-01T00:00:00Z");
        assert_eq!(Windows::new(t, t).count(), 0);
        assert_eq!(Windows::new(ts("2015-01-01T00:00:00Z"), t).count(), 0);
    }

    #[test]
    fn test_leap_day_window_clamps_to_month_end() {
        let end = window_end(ts("2016-02-29T00:00:00Z"), ts("2030-01-01T00:00:00Z"));
        assert_eq!(end, ts("2017-02-28T00:00:00Z"));
    }
}
