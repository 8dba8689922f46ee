//! Remote event source abstraction and the response envelope it returns.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use eex_types::RawEvent;

/// Symbol filter for power generation nonavailability events.
pub const NONAVAILABILITY_SYMBOL: &str = "NonUsabilityGenerationPower";

/// Format for the `Update_Start` / `Update_End` query parameters.
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One windowed query against the event endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub symbol: String,
    pub company_id: String,
    pub update_start: DateTime<FixedOffset>,
    pub update_end: DateTime<FixedOffset>,
}

impl EventQuery {
    /// Query parameters in request order.
    ///
    /// Window bounds are rendered in their own offset; no conversion is applied.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Symbol", self.symbol.clone()),
            ("CompanyID", self.company_id.clone()),
            (
                "Update_Start",
                self.update_start.format(QUERY_TIME_FORMAT).to_string(),
            ),
            (
                "Update_End",
                self.update_end.format(QUERY_TIME_FORMAT).to_string(),
            ),
        ]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The remote side answered "service unavailable"; worth retrying.
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Anything that can answer an [`EventQuery`] with a response envelope.
pub trait EventSource {
    fn query_events(&self, query: &EventQuery) -> Result<ResultList, SourceError>;
}

impl<S: EventSource + ?Sized> EventSource for &S {
    fn query_events(&self, query: &EventQuery) -> Result<ResultList, SourceError> {
        (**self).query_events(query)
    }
}

/// Outer response wrapper: `{"results": [{"result": [...]}, ...]}`.
///
/// `results` is `None` when the field is absent or `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultList {
    #[serde(default)]
    pub results: Option<Vec<ResultSet>>,
}

/// One result set; records are kept as JSON until decoded individually.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub result: Option<Vec<Value>>,
}

impl ResultList {
    /// Build an envelope holding a single result set.
    pub fn single(records: Vec<Value>) -> Self {
        Self {
            results: Some(vec![ResultSet {
                result: Some(records),
            }]),
        }
    }

    /// Records of the first result set; later result sets are never consulted.
    ///
    /// Returns `None` when there is no first result set or it carries no `result` list.
    pub fn first_result(&self) -> Option<&[Value]> {
        self.results.as_ref()?.first()?.result.as_deref()
    }

    /// Decode the first result set into raw events.
    ///
    /// Records that fail to decode are skipped with a warning.
    pub fn into_events(self) -> Option<Vec<RawEvent>> {
        let records = self.results?.into_iter().next()?.result?;
        let events = records
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match serde_json::from_value::<RawEvent>(value) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Skipping undecodable event record {}: {}", i, e);
                    None
                }
            })
            .collect();
        Some(events)
    }
}
