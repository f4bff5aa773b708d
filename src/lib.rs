pub mod engine;
pub mod features;
pub mod shared;

// Re-export the engine surface
pub use engine::{
    evaluate,
    AlertEvent,
    AlertThreshold,
    AlertThresholds,
    CycleExecutor,
    CycleReport,
    Observation,
    Payload,
    ProbeContext,
    ProbeError,
    ProbeKind,
    ProbeOutcome,
    ProbeRegistry,
    ReportKind,
    RunSummary,
    Schedule,
    Scheduler,
    SchedulerState,
    StopReason,
    TimeoutPolicy,
};
pub use features::platform::Platform;

// Re-export shared functionality
pub use shared::traits::{FnProbe, Probe, ReportSink, Validatable};
pub use shared::error::{
    AgentError,
    ConfigError,
    ProbeFailure,
    RegistryError,
    SchedulerError,
    SinkError,
};
pub use shared::config::{AgentConfig, SinkConfig};
pub use shared::storage::{build_sink, ElasticsearchSink, FileSink};
