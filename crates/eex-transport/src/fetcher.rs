//! Single-window event retrieval.

use chrono::{DateTime, FixedOffset};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use eex_types::{RawEvent, RetryConfig};

use crate::retry::{with_retries_and_sleep, Attempt, RetryError};
use crate::source::{EventQuery, EventSource, SourceError, NONAVAILABILITY_SYMBOL};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("service still unavailable after {attempts} attempt(s)")]
    RetryExhausted { attempts: u32 },
    #[error("malformed response envelope: {0}")]
    MalformedResponseEnvelope(String),
    #[error(transparent)]
    Remote(anyhow::Error),
}

impl From<RetryError> for FetchError {
    fn from(e: RetryError) -> Self {
        match e {
            RetryError::Exhausted { attempts } => FetchError::RetryExhausted { attempts },
            RetryError::Fatal(e) => FetchError::Remote(e),
        }
    }
}

/// Issues one retried query per time window.
pub struct WindowFetcher<S> {
    source: S,
    symbol: String,
    retry: RetryConfig,
    sleep: fn(Duration),
}

impl<S: EventSource> WindowFetcher<S> {
    pub fn new(source: S, retry: RetryConfig) -> Self {
        Self {
            source,
            symbol: NONAVAILABILITY_SYMBOL.to_string(),
            retry,
            sleep: std::thread::sleep,
        }
    }

    /// Override the symbol filter sent with every query.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Replace the blocking sleep used between retries.
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Fetch the events updated within `[start, end]` for `company_id`.
    ///
    /// Failures never escape: they are logged and the window yields no events.
    pub fn fetch(
        &self,
        company_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Vec<RawEvent> {
        match self.try_fetch(company_id, start, end) {
            Ok(events) => events,
            Err(e) => {
                error!("get events failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch one window, reporting why it failed.
    pub fn try_fetch(
        &self,
        company_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Vec<RawEvent>, FetchError> {
        let started = Instant::now();
        let query = EventQuery {
            symbol: self.symbol.clone(),
            company_id: company_id.to_string(),
            update_start: start,
            update_end: end,
        };

        let envelope = with_retries_and_sleep(
            &self.retry,
            || match self.source.query_events(&query) {
                Ok(envelope) => Attempt::Done(envelope),
                Err(SourceError::Unavailable(reason)) => Attempt::Transient(reason),
                Err(SourceError::Other(e)) => Attempt::Fatal(e),
            },
            self.sleep,
        )?;

        let events = envelope.into_events().ok_or_else(|| {
            FetchError::MalformedResponseEnvelope("no result list in first result set".to_string())
        })?;

        debug!(
            "Request for events for {} from {} to {} took {}ms",
            company_id,
            start.format("%d.%m.%Y %H:%M"),
            end.format("%d.%m.%Y %H:%M"),
            started.elapsed().as_millis()
        );
        debug!("Got {} events", events.len());
        Ok(events)
    }
}
