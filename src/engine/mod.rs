pub mod alert;
pub mod executor;
pub mod models;
pub mod registry;
pub mod scheduler;

pub use alert::{evaluate, evaluate_observation, AlertThresholds, ALERT_LOG_TARGET};
pub use executor::{CycleExecutor, ORCHESTRATION_PROBE_NAME};
pub use models::*;
pub use registry::{ProbeRegistry, RegisteredProbe, TimeoutPolicy};
pub use scheduler::{RunSummary, Schedule, Scheduler, SchedulerState, StopReason};
