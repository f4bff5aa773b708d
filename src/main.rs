use env_logger::Env;
use log::{debug, error, info};
use perfmon::{
    build_sink,
    AgentConfig,
    AgentError,
    CycleExecutor,
    Platform,
    ProbeRegistry,
    ReportKind,
    Scheduler,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("perfmon stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AgentError> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AgentConfig::load_or_default(config_path.as_deref())?;

    let platform = match config.platform {
        Some(platform) => platform,
        None => Platform::detect()?,
    };
    info!("Starting {} performance monitoring...", platform);

    let thresholds = Arc::new(config.thresholds());

    let mut info_registry = ProbeRegistry::new(config.timeout_policy());
    info_registry.register_all(platform.info_probes())?;
    let mut collection_registry = ProbeRegistry::new(config.timeout_policy());
    collection_registry.register_all(platform.collection_probes())?;
    info!(
        "Registered {} probes ({} concurrent)",
        collection_registry.len(),
        collection_registry.concurrent_set().count()
    );

    let info = CycleExecutor::new(Arc::new(info_registry), thresholds.clone(), config.max_workers)
        .with_kind(ReportKind::SystemInfo);
    let collection = CycleExecutor::new(Arc::new(collection_registry), thresholds, config.max_workers);

    let sink = build_sink(&config.sink, platform)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(listen_for_signals(shutdown.clone()));

    let mut scheduler = Scheduler::new(config.schedule(), info, collection, sink);
    let summary = scheduler.run(shutdown).await?;

    info!(
        "{} performance monitoring completed: {} cycles, {:?}, {} sink failures",
        platform, summary.cycles, summary.stop_reason, summary.sink_failures
    );
    Ok(())
}

/// Cancels `shutdown` on the first SIGINT, SIGTERM or SIGHUP.
#[cfg(unix)]
async fn listen_for_signals(shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut terminate, mut hangup) = match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
        (Ok(terminate), Ok(hangup)) => (terminate, hangup),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            return;
        }
    };

    loop {
        let name = tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => "SIGINT",
                Err(e) => {
                    error!("Failed to listen for SIGINT: {}", e);
                    return;
                }
            },
            _ = terminate.recv() => "SIGTERM",
            _ = hangup.recv() => "SIGHUP",
        };
        request_shutdown(&shutdown, name);
    }
}

#[cfg(not(unix))]
async fn listen_for_signals(shutdown: CancellationToken) {
    while tokio::signal::ctrl_c().await.is_ok() {
        request_shutdown(&shutdown, "Ctrl-C");
    }
}

fn request_shutdown(shutdown: &CancellationToken, signal: &str) {
    if shutdown.is_cancelled() {
        debug!("Received {} while already shutting down", signal);
    } else {
        info!("Received {}, finishing the current cycle before exiting", signal);
        shutdown.cancel();
    }
}
