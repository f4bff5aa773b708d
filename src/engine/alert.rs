use chrono::{DateTime, Utc};
use std::collections::HashMap;
use crate::engine::models::{AlertEvent, AlertThreshold, Observation, Payload};

/// Log target for alert lines, so they can be filtered apart from telemetry.
pub const ALERT_LOG_TARGET: &str = "perfmon::alert";

/// Static threshold table keyed by metric name.
#[derive(Debug, Clone, Default)]
pub struct AlertThresholds {
    by_metric: HashMap<String, AlertThreshold>,
}

impl AlertThresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_limits<I, K>(limits: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        limits
            .into_iter()
            .map(|(metric, limit)| AlertThreshold::greater_than(metric, limit))
            .collect()
    }

    pub fn insert(&mut self, threshold: AlertThreshold) {
        self.by_metric
            .insert(threshold.metric_name.clone(), threshold);
    }

    pub fn get(&self, metric_name: &str) -> Option<&AlertThreshold> {
        self.by_metric.get(metric_name)
    }

    pub fn is_empty(&self) -> bool {
        self.by_metric.is_empty()
    }
}

impl FromIterator<AlertThreshold> for AlertThresholds {
    fn from_iter<T: IntoIterator<Item = AlertThreshold>>(iter: T) -> Self {
        let mut thresholds = Self::new();
        for t in iter {
            thresholds.insert(t);
        }
        thresholds
    }
}

/// Returns an alert iff a threshold exists for `metric_name` and `value`
/// exceeds it. Values are compared in the unit the threshold was defined in.
pub fn evaluate(
    metric_name: &str,
    value: f64,
    thresholds: &AlertThresholds,
    observed_at: DateTime<Utc>,
) -> Option<AlertEvent> {
    let threshold = thresholds.get(metric_name)?;
    threshold
        .comparison
        .check(value, threshold.limit)
        .then(|| AlertEvent {
            metric_name: metric_name.to_string(),
            observed_value: value,
            limit: threshold.limit,
            timestamp: observed_at,
        })
}

/// Alerts raised by every numeric field of an observation.
pub fn evaluate_observation(
    observation: &Observation,
    thresholds: &AlertThresholds,
) -> Vec<AlertEvent> {
    match &observation.payload {
        Payload::Metrics(fields) => fields
            .iter()
            .filter_map(|(name, value)| {
                evaluate(name, *value, thresholds, observation.timestamp)
            })
            .collect(),
        Payload::Text(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_at_90() -> AlertThresholds {
        AlertThresholds::from_limits([("cpu", 90.0)])
    }

    #[test]
    fn value_above_limit_alerts() {
        let now = Utc::now();
        let event = evaluate("cpu", 95.0, &cpu_at_90(), now).unwrap();
        assert_eq!(event.metric_name, "cpu");
        assert_eq!(event.observed_value, 95.0);
        assert_eq!(event.limit, 90.0);
        assert_eq!(event.timestamp, now);
    }

    #[test]
    fn boundary_value_does_not_alert() {
        assert!(evaluate("cpu", 90.0, &cpu_at_90(), Utc::now()).is_none());
    }

    #[test]
    fn unknown_metric_never_alerts() {
        assert!(evaluate("memory", 99.0, &cpu_at_90(), Utc::now()).is_none());
        assert!(evaluate("cpu", 99.0, &AlertThresholds::new(), Utc::now()).is_none());
    }

    #[test]
    fn nan_never_alerts() {
        assert!(evaluate("cpu", f64::NAN, &cpu_at_90(), Utc::now()).is_none());
    }

    #[test]
    fn same_inputs_same_output() {
        let now = Utc::now();
        let thresholds = cpu_at_90();
        assert_eq!(
            evaluate("cpu", 91.5, &thresholds, now),
            evaluate("cpu", 91.5, &thresholds, now)
        );
    }

    #[test]
    fn observation_fields_without_threshold_are_ignored() {
        let thresholds = AlertThresholds::from_limits([("cpu_percent", 90.0), ("memory_percent", 90.0)]);
        let observation = Observation {
            probe_name: "cpu_memory".to_string(),
            timestamp: Utc::now(),
            payload: Payload::metrics([
                ("cpu_percent", 97.0),
                ("memory_percent", 40.0),
                ("memory_total_gb", 512.0),
            ]),
        };

        let alerts = evaluate_observation(&observation, &thresholds);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric_name, "cpu_percent");
    }

    #[test]
    fn text_observation_never_alerts() {
        let observation = Observation {
            probe_name: "uname".to_string(),
            timestamp: Utc::now(),
            payload: Payload::Text("cpu_percent 99".to_string()),
        };
        assert!(evaluate_observation(&observation, &cpu_at_90()).is_empty());
    }
}
