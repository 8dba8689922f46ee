//! Test utilities for event sources.
//!
//! Provides a scripted in-memory [`EventSource`] and a builder for event JSON so fetch
//! and pagination tests run without a network.

use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::source::{EventQuery, EventSource, ResultList, SourceError};

/// Scripted outcome for one call of [`ScriptedSource::query_events`].
#[derive(Debug)]
pub enum Reply {
    Events(Vec<Value>),
    Envelope(ResultList),
    Unavailable,
    Failure(String),
}

/// An [`EventSource`] answering from a queue of scripted replies.
///
/// Every query is recorded. Once the script runs out, further queries receive an
/// empty result set.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    replies: RefCell<VecDeque<Reply>>,
    queries: RefCell<Vec<EventQuery>>,
}

impl ScriptedSource {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Queries received so far, in call order.
    pub fn queries(&self) -> Vec<EventQuery> {
        self.queries.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries.borrow().len()
    }
}

impl EventSource for ScriptedSource {
    fn query_events(&self, query: &EventQuery) -> Result<ResultList, SourceError> {
        self.queries.borrow_mut().push(query.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Events(records)) => Ok(ResultList::single(records)),
            Some(Reply::Envelope(envelope)) => Ok(envelope),
            Some(Reply::Unavailable) => Err(SourceError::Unavailable(
                "503 Service Unavailable".to_string(),
            )),
            Some(Reply::Failure(msg)) => Err(SourceError::Other(anyhow::anyhow!(msg))),
            None => Ok(ResultList::single(Vec::new())),
        }
    }
}

/// Builder for event JSON records as the API delivers them.
///
/// # Example
///
/// ```ignore
/// let record = EventJsonBuilder::new("0012#034_0007")
///     .capacity("1345.5")
///     .status("Active")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct EventJsonBuilder {
    fields: Map<String, Value>,
}

impl EventJsonBuilder {
    /// Create a builder with plausible defaults for every exported field.
    pub fn new(event_id: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("EventID".into(), json!(event_id));
        fields.insert("NUMCapacity".into(), json!("100"));
        fields.insert("CompanyID".into(), json!("EON_EnergyDE"));
        fields.insert("Country".into(), json!("DE"));
        fields.insert("UnitID".into(), json!("UNIT1"));
        fields.insert("Status".into(), json!("Active"));
        fields.insert("TimeStamp".into(), json!("2020-11-19T10:00:00Z"));
        fields.insert("NUMStartDate".into(), json!("2020-11-20T00:00:00Z"));
        fields.insert("NUMEndDate".into(), json!("2020-11-21T00:00:00Z"));
        fields.insert("ModificationTimeStamp".into(), json!("2020-11-19T10:00:00Z"));
        fields.insert("PublicationTimeStamp".into(), json!("2020-11-19T10:05:00Z"));
        Self { fields }
    }

    pub fn capacity(self, capacity: &str) -> Self {
        self.field("NUMCapacity", json!(capacity))
    }

    pub fn status(self, status: &str) -> Self {
        self.field("Status", json!(status))
    }

    pub fn unit(self, unit_id: &str) -> Self {
        self.field("UnitID", json!(unit_id))
    }

    pub fn start(self, ts: &str) -> Self {
        self.field("NUMStartDate", json!(ts))
    }

    pub fn field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}
