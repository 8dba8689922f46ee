//! Nonavailability event records.
//!
//! A record is fetched once as a [`RawEvent`] and never modified afterwards. The decoded
//! identity lives beside it in [`Event`], computed exactly once when the raw record is
//! wrapped.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::identity::{decode, EventIdentity};

/// A nonavailability record as delivered by the remote API.
///
/// Field extraction is best-effort: absent text fields are empty and absent or
/// unreadable timestamps are `None`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEvent {
    /// Composite identifier, `{unit}#{event}_{version}`.
    #[serde(rename = "EventID", default)]
    pub event_id: String,
    /// Kept as text so the publisher's decimal formatting survives the export.
    #[serde(rename = "NUMCapacity", default, deserialize_with = "lenient_text")]
    pub capacity: String,
    #[serde(rename = "CompanyID", default)]
    pub company_id: String,
    #[serde(rename = "Country", default)]
    pub country: String,
    #[serde(rename = "UnitID", default)]
    pub unit_id: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Symbol", default)]
    pub symbol: String,
    #[serde(rename = "Type", default)]
    pub event_type: String,
    #[serde(rename = "NonavailabilityReason", default)]
    pub reason: String,
    #[serde(rename = "Remarks", default)]
    pub remarks: String,
    #[serde(rename = "TimeStamp", default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(rename = "NUMStartDate", default, deserialize_with = "lenient_timestamp")]
    pub start: Option<DateTime<FixedOffset>>,
    #[serde(rename = "NUMEndDate", default, deserialize_with = "lenient_timestamp")]
    pub end: Option<DateTime<FixedOffset>>,
    #[serde(
        rename = "ModificationTimeStamp",
        default,
        deserialize_with = "lenient_timestamp"
    )]
    pub modification: Option<DateTime<FixedOffset>>,
    #[serde(
        rename = "PublicationTimeStamp",
        default,
        deserialize_with = "lenient_timestamp"
    )]
    pub publication: Option<DateTime<FixedOffset>>,
}

/// A fetched record together with its decoded identity.
///
/// `identity` is `None` when the composite identifier could not be decoded; such
/// events take no part in version reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    raw: RawEvent,
    identity: Option<EventIdentity>,
}

impl Event {
    /// Wrap a raw record, decoding its identifier.
    pub fn enrich(raw: RawEvent) -> Self {
        let identity = decode(&raw.event_id).ok();
        Self { raw, identity }
    }

    pub fn raw(&self) -> &RawEvent {
        &self.raw
    }

    pub fn identity(&self) -> Option<&EventIdentity> {
        self.identity.as_ref()
    }

    pub fn logical_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.logical_id.as_str())
    }

    pub fn version(&self) -> Option<u32> {
        self.identity.as_ref().map(|i| i.version)
    }

    pub fn into_raw(self) -> RawEvent {
        self.raw
    }
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        Self::enrich(raw)
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => parse_timestamp(&s),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.fixed_offset()),
        _ => None,
    })
}

/// Parse an API timestamp, keeping its offset. Values without an offset are UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> Value {
        json!({
            "EventID": "0012#034_0007",
            "NUMCapacity": 1345.5,
            "CompanyID": "EON_EnergyDE",
            "Country": "DE",
            "UnitID": "12",
            "Status": "Active",
            "TimeStamp": "2020-11-19T10:15:00+01:00",
            "NUMStartDate": "2020-11-20T00:00:00Z",
            "NUMEndDate": "2020-11-21T00:00:00",
            "ModificationTimeStamp": null,
            "SomethingNew": "ignored"
        })
    }

    #[test]
    fn test_raw_event_best_effort_fields() {
        let raw: RawEvent = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(raw.event_id, "0012#034_0007");
        assert_eq!(raw.capacity, "1345.5");
        assert_eq!(raw.company_id, "EON_EnergyDE");
        assert_eq!(raw.remarks, "");
        assert_eq!(raw.modification, None);
        assert_eq!(raw.publication, None);

        let ts = raw.timestamp.unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 3600);
        assert_eq!(ts.to_rfc3339(), "2020-11-19T10:15:00+01:00");

        let end = raw.end.unwrap();
        assert_eq!(end.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_capacity_string_is_preserved_verbatim() {
        let raw: RawEvent = serde_json::from_value(json!({"NUMCapacity": "1.345,50"})).unwrap();
        assert_eq!(raw.capacity, "1.345,50");
    }

    #[test]
    fn test_unreadable_timestamp_becomes_none() {
        let raw: RawEvent = serde_json::from_value(json!({"TimeStamp": "yesterday"})).unwrap();
        assert_eq!(raw.timestamp, None);
    }

    #[test]
    fn test_enrich_decodes_identity() {
        let raw: RawEvent = serde_json::from_value(sample_json()).unwrap();
        let event = Event::enrich(raw);
        assert_eq!(event.logical_id(), Some("12#034"));
        assert_eq!(event.version(), Some(7));
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let raw: RawEvent = serde_json::from_value(sample_json()).unwrap();
        let once = Event::enrich(raw.clone());
        let twice = Event::enrich(Event::enrich(raw).into_raw());
        assert_eq!(once, twice);
        assert_eq!(once.identity(), twice.identity());
    }

    #[test]
    fn test_enrich_unparseable_identifier_leaves_identity_unset() {
        let raw = RawEvent {
            event_id: "no-delimiters".to_string(),
            ..Default::default()
        };
        let event = Event::from(raw);
        assert_eq!(event.identity(), None);
        assert_eq!(event.logical_id(), None);
        assert_eq!(event.raw().event_id, "no-delimiters");
    }
}
