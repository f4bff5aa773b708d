use crate::engine::models::Payload;
use crate::shared::error::{CommandError, ProbeFailure};
use log::{debug, warn};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use which::which;

/// One external command plus the output shaping the shell pipelines used to do.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    grep: Option<String>,
    head: Option<usize>,
    requires_path: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            grep: None,
            head: None,
            requires_path: None,
            timeout: None,
        }
    }

    /// Whitespace-split command line. No quoting support.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let program = parts.next().unwrap_or_default();
        Self::new(program).args(parts)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Keep only lines matching `pattern`.
    pub fn grep(mut self, pattern: impl Into<String>) -> Self {
        self.grep = Some(pattern.into());
        self
    }

    /// Keep only the first `lines` lines (after `grep`).
    pub fn head(mut self, lines: usize) -> Self {
        self.head = Some(lines);
        self
    }

    /// Treat the command as unavailable when `path` does not exist.
    pub fn requires_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.requires_path = Some(path.into());
        self
    }

    /// Kill the command once it has run for `budget`.
    pub fn timeout(mut self, budget: Duration) -> Self {
        self.timeout = Some(budget);
        self
    }

    pub fn budget(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs the command to completion. The child is killed if this future is
    /// dropped, so an abandoned probe does not leave processes behind.
    pub async fn run(&self) -> Result<String, CommandError> {
        if let Some(path) = &self.requires_path {
            if tokio::fs::metadata(path).await.is_err() {
                return Err(CommandError::NotFound(path.display().to_string()));
            }
        }

        let program = which(&self.program)
            .map_err(|_| CommandError::NotFound(self.program.clone()))?;

        debug!("Executing: {}", self);
        let child = Command::new(program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = match self.timeout {
            Some(budget) => timeout(budget, child).await.map_err(|_| CommandError::TimedOut {
                command: self.to_string(),
                after: budget,
            })??,
            None => child.await?,
        };

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: self.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        self.shape(&String::from_utf8_lossy(&output.stdout))
    }

    fn shape(&self, stdout: &str) -> Result<String, CommandError> {
        let pattern = self.grep.as_deref().map(Regex::new).transpose()?;
        let lines = stdout
            .lines()
            .filter(|line| pattern.as_ref().map_or(true, |re| re.is_match(line)))
            .take(self.head.unwrap_or(usize::MAX));
        Ok(lines.collect::<Vec<_>>().join("\n"))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(pattern) = &self.grep {
            write!(f, " | grep '{}'", pattern)?;
        }
        if let Some(lines) = self.head {
            write!(f, " | head -n {}", lines)?;
        }
        Ok(())
    }
}

/// First whitespace-separated column of every non-empty output line.
pub async fn enumerate(spec: &CommandSpec) -> Result<Vec<String>, CommandError> {
    let output = spec.run().await?;
    Ok(output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

/// Text payload assembled from several command runs, one section each.
#[derive(Debug, Default)]
pub struct Transcript {
    sections: Vec<String>,
    succeeded: usize,
    unavailable: Vec<String>,
    failed: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run(&mut self, spec: &CommandSpec) {
        let result = spec.run().await;
        self.record(&spec.to_string(), result);
    }

    pub fn record(&mut self, label: &str, result: Result<String, CommandError>) {
        match result {
            Ok(output) => {
                self.succeeded += 1;
                self.sections.push(format!("$ {}\n{}", label, output));
            }
            Err(CommandError::TimedOut { command, after }) => {
                warn!("Command '{}' timed out after {} seconds", command, after.as_secs());
                self.sections
                    .push(format!("$ {}\n[timed out after {}s]", label, after.as_secs()));
                self.failed.push(format!("'{}' timed out", command));
            }
            Err(e) => match ProbeFailure::from(e) {
                ProbeFailure::Unavailable(what) => {
                    self.sections
                        .push(format!("$ {}\n[unavailable: {}]", label, what));
                    self.unavailable.push(what);
                }
                other => {
                    self.sections.push(format!("$ {}\n[failed: {}]", label, other));
                    self.failed.push(other.to_string());
                }
            },
        }
    }

    pub fn note(&mut self, line: impl Into<String>) {
        self.succeeded += 1;
        self.sections.push(line.into());
    }

    /// Nothing ran and nothing failed: unavailable. Nothing ran but
    /// something failed: execution failure. Otherwise a text observation.
    pub fn finish(self) -> Result<Payload, ProbeFailure> {
        if self.succeeded == 0 {
            if !self.failed.is_empty() {
                return Err(ProbeFailure::ExecutionFailed(self.failed.join("; ")));
            }
            return Err(ProbeFailure::Unavailable(self.unavailable.join(", ")));
        }
        Ok(Payload::Text(self.sections.join("\n\n")))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let spec = CommandSpec::parse("svmon -P").head(20);
        assert_eq!(spec.program(), "svmon");
        assert_eq!(spec.to_string(), "svmon -P | head -n 20");

        let spec = CommandSpec::parse("sysctl -a").grep(r"machdep\.cpu");
        assert_eq!(spec.to_string(), r"sysctl -a | grep 'machdep\.cpu'");
    }

    #[test]
    fn shape_applies_grep_then_head() {
        let spec = CommandSpec::new("x").grep("^lv").head(2);
        let shaped = spec.shape("header\nlv00 jfs2\nlv01 jfs2\nlv02 jfs2\n").unwrap();
        assert_eq!(shaped, "lv00 jfs2\nlv01 jfs2");
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let spec = CommandSpec::new("x").grep("(");
        assert!(matches!(spec.shape("a"), Err(CommandError::Pattern(_))));
    }

    #[tokio::test]
    async fn runs_real_command() {
        let out = CommandSpec::new("printf")
            .arg("alpha\nbeta\ngamma\n")
            .head(2)
            .run()
            .await
            .unwrap();
        assert_eq!(out, "alpha\nbeta");
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let err = CommandSpec::new("definitely-not-a-real-binary-4711")
            .run()
            .await
            .unwrap_err();
        assert!(ProbeFailure::from(err).is_unavailable());
    }

    #[tokio::test]
    async fn missing_required_path_is_unavailable() {
        let err = CommandSpec::parse("tail -n 50 /nonexistent/syslog")
            .requires_path("/nonexistent/syslog")
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_zero_exit_is_execution_failure() {
        let err = CommandSpec::new("false").run().await.unwrap_err();
        assert!(matches!(err, CommandError::Failed { .. }));
        assert!(matches!(
            ProbeFailure::from(err),
            ProbeFailure::ExecutionFailed(_)
        ));
    }

    #[tokio::test]
    async fn enumerate_takes_first_column() {
        let items = enumerate(&CommandSpec::new("printf").arg("hdisk0 00c rootvg\nhdisk1 00d datavg\n\n"))
            .await
            .unwrap();
        assert_eq!(items, vec!["hdisk0", "hdisk1"]);
    }

    #[tokio::test]
    async fn slow_command_is_killed_at_its_budget() {
        let started = std::time::Instant::now();
        let err = CommandSpec::parse("sleep 30")
            .timeout(Duration::from_millis(300))
            .run()
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(matches!(err, CommandError::TimedOut { .. }));
        assert!(matches!(ProbeFailure::from(err), ProbeFailure::TimedOut { after_ms: 300 }));
    }

    #[tokio::test]
    async fn transcript_keeps_output_before_a_timed_out_command() {
        let mut transcript = Transcript::new();
        transcript.run(&CommandSpec::parse("echo ps-ef-output")).await;
        transcript
            .run(&CommandSpec::parse("sleep 30").timeout(Duration::from_secs(1)))
            .await;

        match transcript.finish().unwrap() {
            Payload::Text(text) => {
                assert!(text.contains("$ echo ps-ef-output\nps-ef-output"));
                assert!(text.contains("$ sleep 30\n[timed out after 1s]"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn transcript_classification() {
        let mut all_missing = Transcript::new();
        all_missing.record("nfsstat -s", Err(CommandError::NotFound("nfsstat".into())));
        assert!(all_missing.finish().unwrap_err().is_unavailable());

        let mut broken = Transcript::new();
        broken.record("nfsstat -s", Err(CommandError::NotFound("nfsstat".into())));
        broken.record(
            "mount",
            Err(CommandError::Failed {
                command: "mount".into(),
                status: "exit status: 1".into(),
                stderr: "denied".into(),
            }),
        );
        assert!(matches!(
            broken.finish().unwrap_err(),
            ProbeFailure::ExecutionFailed(_)
        ));

        let mut partial = Transcript::new();
        partial.record("df -h", Ok("/dev/sda1 50%".into()));
        partial.record("du -sh /var", Err(CommandError::NotFound("du".into())));
        match partial.finish().unwrap() {
            Payload::Text(text) => {
                assert!(text.contains("$ df -h\n/dev/sda1 50%"));
                assert!(text.contains("[unavailable: du]"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
