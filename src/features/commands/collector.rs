use async_trait::async_trait;
use std::time::Duration;
use crate::engine::models::{Payload, ProbeContext, ProbeKind};
use crate::shared::command::{CommandSpec, Transcript};
use crate::shared::error::{CommandError, ProbeFailure};
use crate::shared::traits::Probe;

#[derive(Debug, Clone)]
struct Step {
    primary: CommandSpec,
    fallback: Option<CommandSpec>,
}

/// Headroom over the summed command budgets, for spawning and shaping.
const BUDGET_SLACK: Duration = Duration::from_secs(5);

impl Step {
    async fn run(&self, default_budget: Option<Duration>) -> (String, Result<String, CommandError>) {
        let primary = with_budget(&self.primary, default_budget);
        match (primary.run().await, &self.fallback) {
            (Err(CommandError::NotFound(_)), Some(fallback)) => {
                let fallback = with_budget(fallback, default_budget);
                (fallback.to_string(), fallback.run().await)
            }
            (result, _) => (primary.to_string(), result),
        }
    }

    fn budget(&self, default_budget: Option<Duration>) -> Option<Duration> {
        let primary = self.primary.budget().or(default_budget)?;
        match &self.fallback {
            Some(fallback) => Some(primary.max(fallback.budget().or(default_budget)?)),
            None => Some(primary),
        }
    }
}

fn with_budget(spec: &CommandSpec, default_budget: Option<Duration>) -> CommandSpec {
    match (spec.budget(), default_budget) {
        (None, Some(budget)) => spec.clone().timeout(budget),
        _ => spec.clone(),
    }
}

/// Runs a fixed list of commands in order and reports their combined output.
pub struct CommandProbe {
    name: String,
    kind: ProbeKind,
    timeout: Option<Duration>,
    command_timeout: Option<Duration>,
    steps: Vec<Step>,
}

impl CommandProbe {
    pub fn new(name: impl Into<String>, kind: ProbeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            timeout: None,
            command_timeout: None,
            steps: Vec::new(),
        }
    }

    /// Shorthand for a probe running a single whitespace-split command line.
    pub fn single(name: impl Into<String>, kind: ProbeKind, line: &str) -> Self {
        Self::new(name, kind).command(CommandSpec::parse(line))
    }

    pub fn command(mut self, spec: CommandSpec) -> Self {
        self.steps.push(Step {
            primary: spec,
            fallback: None,
        });
        self
    }

    pub fn line(self, line: &str) -> Self {
        self.command(CommandSpec::parse(line))
    }

    /// Runs `fallback` instead when `primary` is not installed.
    pub fn command_or(mut self, primary: CommandSpec, fallback: CommandSpec) -> Self {
        self.steps.push(Step {
            primary,
            fallback: Some(fallback),
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Budget for every command that does not carry its own. A command that
    /// runs out is recorded as timed out and the remaining commands still run.
    pub fn command_timeout(mut self, budget: Duration) -> Self {
        self.command_timeout = Some(budget);
        self
    }
}

#[async_trait]
impl Probe for CommandProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    /// An explicit budget wins. Otherwise, when every command is bounded,
    /// the probe declares the sum so one slow command cannot time out the rest.
    fn timeout(&self) -> Option<Duration> {
        if self.timeout.is_some() {
            return self.timeout;
        }
        self.steps
            .iter()
            .map(|step| step.budget(self.command_timeout))
            .sum::<Option<Duration>>()
            .map(|total| total + BUDGET_SLACK)
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        let mut transcript = Transcript::new();
        for step in &self.steps {
            let (label, result) = step.run(self.command_timeout).await;
            transcript.record(&label, result);
        }
        transcript.finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ctx() -> ProbeContext {
        ProbeContext {
            sequence: 1,
            cycle_started_at: Utc::now(),
        }
    }

    const MISSING: &str = "definitely-not-a-real-binary-4711";

    #[tokio::test]
    async fn combines_sections_in_order() {
        let probe = CommandProbe::new("info", ProbeKind::Sequential)
            .command(CommandSpec::new("printf").arg("first"))
            .command(CommandSpec::new("printf").arg("second"));

        match probe.run(&ctx()).await.unwrap() {
            Payload::Text(text) => {
                assert_eq!(text, "$ printf first\nfirst\n\n$ printf second\nsecond");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn falls_back_when_primary_missing() {
        let probe = CommandProbe::new("disk_io", ProbeKind::Concurrent).command_or(
            CommandSpec::new(MISSING),
            CommandSpec::new("printf").arg("vmstat output"),
        );

        match probe.run(&ctx()).await.unwrap() {
            Payload::Text(text) => assert!(text.contains("vmstat output")),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn stuck_command_keeps_earlier_output() {
        let probe = CommandProbe::new("processes", ProbeKind::Sequential)
            .line("echo ps-ef-output")
            .command(CommandSpec::parse("sleep 30").timeout(Duration::from_secs(1)))
            .line("echo svmon-output");

        match probe.run(&ctx()).await.unwrap() {
            Payload::Text(text) => {
                assert!(text.contains("ps-ef-output"));
                assert!(text.contains("$ sleep 30\n[timed out after 1s]"));
                assert!(text.contains("svmon-output"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn declared_budget_covers_every_command() {
        let unbounded = CommandProbe::new("filesystem", ProbeKind::Sequential)
            .line("df -h")
            .line("mount");
        assert_eq!(unbounded.timeout(), None);

        let bounded = CommandProbe::new("processes", ProbeKind::Sequential)
            .command_timeout(Duration::from_secs(60))
            .line("ps -ef")
            .command(CommandSpec::parse("topas").timeout(Duration::from_secs(30)));
        assert_eq!(bounded.timeout(), Some(Duration::from_secs(95)));

        let explicit = bounded.with_timeout(Duration::from_secs(10));
        assert_eq!(explicit.timeout(), Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn all_missing_is_unavailable() {
        let probe = CommandProbe::new("nfs_stats", ProbeKind::Sequential)
            .line(&format!("{MISSING} -s"))
            .line(&format!("{MISSING} -c"));
        assert!(probe.run(&ctx()).await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn only_failures_is_execution_failure() {
        let probe = CommandProbe::single("broken", ProbeKind::Sequential, "false");
        assert!(matches!(
            probe.run(&ctx()).await.unwrap_err(),
            ProbeFailure::ExecutionFailed(_)
        ));
    }
}
