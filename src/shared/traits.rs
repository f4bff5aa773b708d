use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use crate::engine::models::{CycleReport, Payload, ProbeContext, ProbeKind};
use crate::shared::error::{ProbeFailure, SinkError};

/// A named unit of telemetry work.
///
/// `run` must not block the async worker it is polled on: blocking system
/// calls belong on `spawn_blocking`, child processes on `tokio::process`.
/// The engine enforces the timeout by dropping the future, so anything the
/// probe cannot cancel is abandoned rather than awaited.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ProbeKind;

    /// Execution budget declared by the probe itself. Config overrides win.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Payload, ProbeFailure>;
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, report: &CycleReport) -> Result<(), SinkError>;
}

pub trait Validatable {
    fn validate(&self) -> Result<(), String>;
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Probe backed by a closure returning a future.
pub struct FnProbe<F> {
    name: String,
    kind: ProbeKind,
    timeout: Option<Duration>,
    action: F,
}

impl<F, Fut> FnProbe<F>
where
    F: Fn(ProbeContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Payload, ProbeFailure>> + Send,
{
    pub fn new(name: impl Into<String>, kind: ProbeKind, action: F) -> Self {
        Self {
            name: name.into(),
            kind,
            timeout: None,
            action,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn(ProbeContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Payload, ProbeFailure>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        (self.action)(*ctx).await
    }
}
