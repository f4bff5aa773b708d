use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use crate::shared::error::ProbeFailure;

/// Whether a probe may run alongside its siblings or must run in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Concurrent,
    Sequential,
}

/// Context handed to every probe invocation. Probes are free to ignore it.
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext {
    pub sequence: u64,
    pub cycle_started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    Metrics(BTreeMap<String, f64>),
}

impl Payload {
    pub fn metrics<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Payload::Metrics(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        match self {
            Payload::Metrics(fields) => fields.get(name).copied(),
            Payload::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub probe_name: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeError {
    pub probe_name: String,
    pub timestamp: DateTime<Utc>,
    pub cause: ProbeFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Observation(Observation),
    Failure(ProbeError),
}

impl ProbeOutcome {
    pub fn from_result(
        probe_name: &str,
        timestamp: DateTime<Utc>,
        result: Result<Payload, ProbeFailure>,
    ) -> Self {
        match result {
            Ok(payload) => ProbeOutcome::Observation(Observation {
                probe_name: probe_name.to_string(),
                timestamp,
                payload,
            }),
            Err(cause) => ProbeOutcome::Failure(ProbeError {
                probe_name: probe_name.to_string(),
                timestamp,
                cause,
            }),
        }
    }

    pub fn probe_name(&self) -> &str {
        match self {
            ProbeOutcome::Observation(o) => &o.probe_name,
            ProbeOutcome::Failure(e) => &e.probe_name,
        }
    }

    pub fn observation(&self) -> Option<&Observation> {
        match self {
            ProbeOutcome::Observation(o) => Some(o),
            ProbeOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProbeError> {
        match self {
            ProbeOutcome::Observation(_) => None,
            ProbeOutcome::Failure(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
}

impl Comparison {
    pub fn check(&self, value: f64, limit: f64) -> bool {
        match self {
            Comparison::GreaterThan => value > limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThreshold {
    pub metric_name: String,
    pub limit: f64,
    pub comparison: Comparison,
}

impl AlertThreshold {
    pub fn greater_than(metric_name: impl Into<String>, limit: f64) -> Self {
        Self {
            metric_name: metric_name.into(),
            limit,
            comparison: Comparison::GreaterThan,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub metric_name: String,
    pub observed_value: f64,
    pub limit: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    SystemInfo,
    Collection,
}

/// Everything one cycle produced. Concurrent outcomes appear in completion
/// order, followed by sequential outcomes in registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub id: Uuid,
    pub sequence: u64,
    pub kind: ReportKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ProbeOutcome>,
    pub alerts: Vec<AlertEvent>,
}

impl CycleReport {
    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.outcomes.iter().filter_map(ProbeOutcome::observation)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeError> {
        self.outcomes.iter().filter_map(ProbeOutcome::failure)
    }

    pub fn outcome(&self, probe_name: &str) -> Option<&ProbeOutcome> {
        self.outcomes.iter().find(|o| o.probe_name() == probe_name)
    }
}
