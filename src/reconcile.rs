//! Version lineage audit.
//!
//! Every revision of a nonavailability event is published as its own record. This
//! module groups records by logical event and walks each group from the newest version
//! down, reporting duplicate versions and gaps in the sequence. Anomalies are data:
//! they are returned and logged, never raised as errors.
//!
//! The newest record of every group is remembered so the export can optionally be
//! narrowed to one row per logical event.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use eex_types::{Event, RawEvent};

use crate::run_log::{RunLog, LINE_TIME_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnomalyKind {
    /// The same version number appears more than once.
    DuplicateVersion { version: u32 },
    /// Versions strictly between `newer` and `older` are missing.
    MissingVersions { missing: u32, newer: u32, older: u32 },
}

/// An irregularity in one logical event's version lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub logical_id: String,
    pub kind: AnomalyKind,
    pub detected_at: DateTime<Local>,
}

impl Anomaly {
    /// Statistics line, prefixed with the detection time.
    pub fn line(&self) -> String {
        format!("{}: {}", self.detected_at.format(LINE_TIME_FORMAT), self)
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AnomalyKind::DuplicateVersion { version } => write!(
                f,
                "The Event {} has more than one version {}",
                self.logical_id, version
            ),
            AnomalyKind::MissingVersions {
                missing,
                newer,
                older,
            } => write!(
                f,
                "The Event {} has {} missing version(s) between {} and {}",
                self.logical_id, missing, newer, older
            ),
        }
    }
}

/// Result of reconciling a run's records.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Enriched records in their original fetch order.
    pub events: Vec<Event>,
    /// Anomalies in detection order.
    pub anomalies: Vec<Anomaly>,
    /// Index into `events` of the highest version of each logical event, in order of
    /// each group's first appearance.
    pub latest: Vec<usize>,
    /// Number of records whose identifier could not be decoded.
    pub unparsed: usize,
}

impl Reconciliation {
    pub fn group_count(&self) -> usize {
        self.latest.len()
    }

    /// The highest-version record of each logical event, in fetch order.
    pub fn latest_events(&self) -> Vec<&Event> {
        let mut indices = self.latest.clone();
        indices.sort_unstable();
        indices.iter().map(|&i| &self.events[i]).collect()
    }

    /// Append every anomaly line to the run log.
    pub fn record_anomalies(&self, log: &mut RunLog) {
        for anomaly in &self.anomalies {
            log.record_at(anomaly.detected_at, anomaly.to_string());
        }
    }
}

/// Decode every raw record and audit the resulting version lineages.
pub fn reconcile(records: Vec<RawEvent>) -> Reconciliation {
    reconcile_events(records.into_iter().map(Event::enrich).collect())
}

/// Audit the version lineages of already enriched events.
pub fn reconcile_events(events: Vec<Event>) -> Reconciliation {
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    let mut unparsed = 0usize;

    for (idx, event) in events.iter().enumerate() {
        let Some(logical_id) = event.logical_id() else {
            debug!("Unparseable event identifier '{}'", event.raw().event_id);
            unparsed += 1;
            continue;
        };
        groups
            .entry(logical_id.to_string())
            .or_insert_with(|| {
                group_order.push(logical_id.to_string());
                Vec::new()
            })
            .push(idx);
    }

    let mut anomalies = Vec::new();
    let mut latest = Vec::with_capacity(group_order.len());

    for logical_id in &group_order {
        let Some(members) = groups.get_mut(logical_id) else {
            continue;
        };
        // Stable: equal versions keep fetch order and stay adjacent.
        members.sort_by(|&a, &b| version_of(&events[b]).cmp(&version_of(&events[a])));
        latest.push(members[0]);

        let versions: Vec<u32> = members.iter().map(|&i| version_of(&events[i])).collect();
        anomalies.extend(audit_lineage(logical_id, &versions));
    }

    Reconciliation {
        events,
        anomalies,
        latest,
        unparsed,
    }
}

/// Report duplicates and gaps in a lineage sorted by descending version.
///
/// Each adjacent pair yields at most one anomaly: a duplicate when both versions are
/// equal, otherwise a gap when they are not consecutive.
pub fn audit_lineage(logical_id: &str, versions_desc: &[u32]) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    let mut last: Option<u32> = None;

    for &version in versions_desc {
        if let Some(last) = last {
            let kind = if version == last {
                Some(AnomalyKind::DuplicateVersion { version })
            } else if version.checked_add(1) != Some(last) {
                Some(AnomalyKind::MissingVersions {
                    missing: last.saturating_sub(version).saturating_sub(1),
                    newer: last,
                    older: version,
                })
            } else {
                None
            };

            if let Some(kind) = kind {
                let anomaly = Anomaly {
                    logical_id: logical_id.to_string(),
                    kind,
                    detected_at: Local::now(),
                };
                warn!("{}", anomaly);
                anomalies.push(anomaly);
            }
        }
        last = Some(version);
    }

    anomalies
}

fn version_of(event: &Event) -> u32 {
    event.version().unwrap_or_default()
}
