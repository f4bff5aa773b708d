use chrono::{DateTime, Utc};
use futures::FutureExt;
use log::{debug, error, warn};
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::timeout;
use uuid::Uuid;
use crate::engine::alert::{evaluate_observation, AlertThresholds, ALERT_LOG_TARGET};
use crate::engine::models::{
    AlertEvent, CycleReport, ProbeContext, ProbeError, ProbeOutcome, ReportKind,
};
use crate::engine::registry::{ProbeRegistry, RegisteredProbe};
use crate::shared::error::ProbeFailure;

/// Name under which failures of the orchestration itself are reported.
pub const ORCHESTRATION_PROBE_NAME: &str = "cycle_executor";

/// Runs one full pass over a registry and turns every probe result into data.
#[derive(Clone)]
pub struct CycleExecutor {
    registry: Arc<ProbeRegistry>,
    thresholds: Arc<AlertThresholds>,
    workers: Arc<Semaphore>,
    kind: ReportKind,
}

impl CycleExecutor {
    pub fn new(
        registry: Arc<ProbeRegistry>,
        thresholds: Arc<AlertThresholds>,
        max_workers: usize,
    ) -> Self {
        let pool_size = registry
            .concurrent_set()
            .count()
            .min(max_workers)
            .max(1);
        debug!("Cycle executor worker pool size: {}", pool_size);

        Self {
            registry,
            thresholds,
            workers: Arc::new(Semaphore::new(pool_size)),
            kind: ReportKind::Collection,
        }
    }

    pub fn with_kind(mut self, kind: ReportKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Stops handing out worker slots. Probes started afterwards fail fast.
    pub fn shutdown(&self) {
        self.workers.close();
    }

    /// Executes one cycle. Never fails: orchestration faults become outcomes.
    pub async fn execute(&self, sequence: u64) -> CycleReport {
        let started_at = Utc::now();
        let ctx = ProbeContext {
            sequence,
            cycle_started_at: started_at,
        };
        let accumulator = Arc::new(Mutex::new(CycleAccumulator::new(
            self.thresholds.clone(),
        )));

        let pass = tokio::spawn(self.clone().run_pass(ctx, accumulator.clone()));
        if let Err(e) = pass.await {
            error!("Cycle {} orchestration failed: {}", sequence, e);
            let mut acc = accumulator.lock().await;
            acc.record(failure(
                ORCHESTRATION_PROBE_NAME,
                ProbeFailure::ExecutionFailed(e.to_string()),
            ));
            for entry in self.registry.probes() {
                if !acc.has_outcome(entry.name()) {
                    acc.record(failure(
                        entry.name(),
                        ProbeFailure::ExecutionFailed(
                            "cycle aborted before the probe settled".to_string(),
                        ),
                    ));
                }
            }
        }

        let mut acc = accumulator.lock().await;
        acc.finish(sequence, self.kind, started_at)
    }

    async fn run_pass(self, ctx: ProbeContext, acc: Arc<Mutex<CycleAccumulator>>) {
        let mut workers = JoinSet::new();
        let mut pending = HashSet::new();

        for entry in self.registry.concurrent_set() {
            let entry = entry.clone();
            let slots = self.workers.clone();
            pending.insert(entry.name().to_string());
            workers.spawn(async move {
                let _slot = match slots.acquire_owned().await {
                    Ok(slot) => slot,
                    Err(_) => {
                        return failure(
                            entry.name(),
                            ProbeFailure::ExecutionFailed("worker pool closed".to_string()),
                        )
                    }
                };
                invoke(&entry, &ctx).await
            });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => {
                    pending.remove(outcome.probe_name());
                    acc.lock().await.record(outcome);
                }
                Err(e) => warn!("Probe worker ended abnormally: {}", e),
            }
        }

        // Workers that died without reporting still owe an outcome.
        for entry in self.registry.concurrent_set() {
            if pending.contains(entry.name()) {
                acc.lock().await.record(failure(
                    entry.name(),
                    ProbeFailure::ExecutionFailed(
                        "worker ended without reporting an outcome".to_string(),
                    ),
                ));
            }
        }

        for entry in self.registry.sequential_set() {
            let outcome = invoke(entry, &ctx).await;
            acc.lock().await.record(outcome);
        }
    }
}

async fn invoke(entry: &RegisteredProbe, ctx: &ProbeContext) -> ProbeOutcome {
    let budget = entry.timeout;
    debug!("Running probe '{}' (timeout {:?})", entry.name(), budget);

    let run = AssertUnwindSafe(entry.probe.run(ctx)).catch_unwind();
    let result = match timeout(budget, run).await {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => Err(ProbeFailure::ExecutionFailed(format!(
            "probe panicked: {}",
            panic_message(panic.as_ref())
        ))),
        Err(_) => Err(ProbeFailure::TimedOut {
            after_ms: budget.as_millis() as u64,
        }),
    };

    ProbeOutcome::from_result(entry.name(), Utc::now(), result)
}

fn failure(probe_name: &str, cause: ProbeFailure) -> ProbeOutcome {
    ProbeOutcome::Failure(ProbeError {
        probe_name: probe_name.to_string(),
        timestamp: Utc::now(),
        cause,
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Collects outcomes as they settle and surfaces alerts immediately.
struct CycleAccumulator {
    thresholds: Arc<AlertThresholds>,
    outcomes: Vec<ProbeOutcome>,
    alerts: Vec<AlertEvent>,
    unavailable: Vec<String>,
}

impl CycleAccumulator {
    fn new(thresholds: Arc<AlertThresholds>) -> Self {
        Self {
            thresholds,
            outcomes: Vec::new(),
            alerts: Vec::new(),
            unavailable: Vec::new(),
        }
    }

    fn has_outcome(&self, probe_name: &str) -> bool {
        self.outcomes.iter().any(|o| o.probe_name() == probe_name)
    }

    fn record(&mut self, outcome: ProbeOutcome) {
        match &outcome {
            ProbeOutcome::Observation(observation) => {
                debug!("Probe '{}' succeeded", observation.probe_name);
                for alert in evaluate_observation(observation, &self.thresholds) {
                    warn!(
                        target: ALERT_LOG_TARGET,
                        "ALERT: {} is {} (limit {}) reported by probe '{}'",
                        alert.metric_name,
                        alert.observed_value,
                        alert.limit,
                        observation.probe_name
                    );
                    self.alerts.push(alert);
                }
            }
            ProbeOutcome::Failure(e) if e.cause.is_unavailable() => {
                self.unavailable.push(e.probe_name.clone());
            }
            ProbeOutcome::Failure(e) => {
                error!("Probe '{}' failed: {}", e.probe_name, e.cause);
            }
        }
        self.outcomes.push(outcome);
    }

    fn finish(
        &mut self,
        sequence: u64,
        kind: ReportKind,
        started_at: DateTime<Utc>,
    ) -> CycleReport {
        if !self.unavailable.is_empty() {
            warn!(
                "Cycle {}: {} probe(s) unavailable on this host: {}",
                sequence,
                self.unavailable.len(),
                self.unavailable.join(", ")
            );
        }

        CycleReport {
            id: Uuid::new_v4(),
            sequence,
            kind,
            started_at,
            finished_at: Utc::now(),
            outcomes: std::mem::take(&mut self.outcomes),
            alerts: std::mem::take(&mut self.alerts),
        }
    }
}
