use async_trait::async_trait;
use perfmon::{
    AgentConfig,
    CycleExecutor,
    CycleReport,
    FileSink,
    FnProbe,
    Payload,
    Probe,
    ProbeFailure,
    ProbeKind,
    ProbeRegistry,
    RegistryError,
    ReportKind,
    ReportSink,
    Scheduler,
    SinkError,
    StopReason,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct CountingSink {
    delivered: AtomicUsize,
}

#[async_trait]
impl ReportSink for CountingSink {
    async fn deliver(&self, _report: &CycleReport) -> Result<(), SinkError> {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn cpu_probe(percent: f64) -> Arc<dyn Probe> {
    Arc::new(FnProbe::new("cpu_memory", ProbeKind::Concurrent, move |_| async move {
        Ok(Payload::metrics([("cpu_percent", percent), ("memory_percent", 40.0)]))
    }))
}

fn missing_tool_probe() -> Arc<dyn Probe> {
    Arc::new(FnProbe::new("nfs_stats", ProbeKind::Concurrent, |_| async {
        Err(ProbeFailure::Unavailable("nfsstat".to_string()))
    }))
}

fn filesystem_probe() -> Arc<dyn Probe> {
    Arc::new(FnProbe::new("filesystem", ProbeKind::Sequential, |_| async {
        Ok(Payload::Text("/dev/sda1 50G 20G 30G 40% /".to_string()))
    }))
}

fn collection_executor(config: &AgentConfig) -> CycleExecutor {
    let mut registry = ProbeRegistry::new(config.timeout_policy());
    registry
        .register_all([cpu_probe(95.0), missing_tool_probe(), filesystem_probe()])
        .unwrap();
    CycleExecutor::new(Arc::new(registry), Arc::new(config.thresholds()), config.max_workers)
}

fn info_executor(config: &AgentConfig) -> CycleExecutor {
    let mut registry = ProbeRegistry::new(config.timeout_policy());
    registry
        .register(Arc::new(FnProbe::new("system_info", ProbeKind::Sequential, |_| async {
            Ok(Payload::Text("Linux host 6.1.0 x86_64".to_string()))
        })))
        .unwrap();
    CycleExecutor::new(Arc::new(registry), Arc::new(config.thresholds()), config.max_workers)
        .with_kind(ReportKind::SystemInfo)
}

#[tokio::test]
async fn one_cycle_covers_every_probe_and_raises_one_alert() {
    let config = AgentConfig::from_yaml(
        "probe_timeout_secs: 5\nalert_thresholds:\n  cpu_percent: 90\n",
    )
    .unwrap();

    let report = collection_executor(&config).execute(1).await;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[2].probe_name(), "filesystem");

    let cpu = report.outcome("cpu_memory").and_then(|o| o.observation()).unwrap();
    assert_eq!(cpu.payload.metric("cpu_percent"), Some(95.0));

    let nfs = report.outcome("nfs_stats").and_then(|o| o.failure()).unwrap();
    assert!(nfs.cause.is_unavailable());

    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].metric_name, "cpu_percent");
    assert_eq!(report.alerts[0].observed_value, 95.0);
    assert_eq!(report.alerts[0].limit, 90.0);
}

#[test]
fn duplicate_probe_names_are_rejected() {
    let config = AgentConfig::default();
    let mut registry = ProbeRegistry::new(config.timeout_policy());
    registry.register(cpu_probe(10.0)).unwrap();

    let err = registry.register(cpu_probe(20.0)).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateName("cpu_memory".to_string()));
    assert_eq!(registry.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn scheduled_run_writes_one_document_per_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Linux_Perf_Monitor.jsonl");
    let config = AgentConfig::from_yaml("interval_secs: 10\ntotal_duration_secs: 20\n").unwrap();

    let sink = Arc::new(FileSink::new(&path, "host-a"));
    let mut scheduler = Scheduler::new(
        config.schedule(),
        info_executor(&config),
        collection_executor(&config),
        sink,
    );
    let summary = scheduler.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.stop_reason, StopReason::DurationElapsed);
    assert_eq!(summary.sink_failures, 0);

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    let documents: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(documents.len(), 4);
    assert_eq!(documents[0]["kind"], "system_info");
    assert_eq!(documents[0]["sequence"], 0);
    for (i, doc) in documents.iter().enumerate().skip(1) {
        assert_eq!(doc["kind"], "collection");
        assert_eq!(doc["sequence"], i as u64);
        assert_eq!(doc["host"], "host-a");
        assert_eq!(doc["alerts"].as_array().map(Vec::len), Some(1));
    }
}

#[tokio::test(start_paused = true)]
async fn shutdown_signal_stops_an_unbounded_run() {
    let config = AgentConfig::from_yaml("interval_secs: 10\ntotal_duration_secs: null\n").unwrap();
    let sink = Arc::new(CountingSink::default());

    let mut scheduler = Scheduler::new(
        config.schedule(),
        info_executor(&config),
        collection_executor(&config),
        sink.clone(),
    );

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        sleep(Duration::from_secs(35)).await;
        trigger.cancel();
    });

    let summary = scheduler.run(shutdown).await.unwrap();
    assert_eq!(summary.cycles, 4);
    assert_eq!(summary.stop_reason, StopReason::ShutdownRequested);
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn maximum_interval_from_config_runs_one_cycle_then_waits() {
    let config = AgentConfig::from_yaml(
        "interval_secs: 18446744073709551615\ntotal_duration_secs: null\n",
    )
    .unwrap();
    let sink = Arc::new(CountingSink::default());

    let mut scheduler = Scheduler::new(
        config.schedule(),
        info_executor(&config),
        collection_executor(&config),
        sink.clone(),
    );

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let summary = scheduler.run(shutdown).await.unwrap();
    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.stop_reason, StopReason::ShutdownRequested);
    assert_eq!(sink.delivered.load(Ordering::SeqCst), 2);
}
