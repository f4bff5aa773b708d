use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::io;
use std::time::Duration;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration failed: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry construction failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Sink setup failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Scheduler failed: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

/// Why a single probe invocation produced no observation.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    /// The command or API does not exist on this host. Expected, not a fault.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl ProbeFailure {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProbeFailure::Unavailable(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Probe '{0}' is already registered")]
    DuplicateName(String),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Failed to store report: {0}")]
    Store(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Cycle executor failed to return: {0}")]
    ExecutorFailed(String),

    #[error("Scheduler has already been started")]
    AlreadyStarted,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Command '{command}' failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Command '{command}' timed out after {}s", .after.as_secs())]
    TimedOut { command: String, after: Duration },

    #[error("Invalid output filter: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<CommandError> for ProbeFailure {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::NotFound(what) => ProbeFailure::Unavailable(what),
            CommandError::TimedOut { after, .. } => ProbeFailure::TimedOut {
                after_ms: after.as_millis() as u64,
            },
            CommandError::Io(e) if e.kind() == io::ErrorKind::NotFound => {
                ProbeFailure::Unavailable(e.to_string())
            }
            other => ProbeFailure::ExecutionFailed(other.to_string()),
        }
    }
}
