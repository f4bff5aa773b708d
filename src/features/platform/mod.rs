mod aix;
mod linux;
mod macos;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use crate::shared::error::AgentError;
use crate::shared::traits::Probe;

pub type ProbeSet = Vec<Arc<dyn Probe>>;

/// Operating system family the agent collects for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOs,
    Aix,
}

impl Platform {
    pub fn detect() -> Result<Self, AgentError> {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Result<Self, AgentError> {
        match os {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::MacOs),
            "aix" => Ok(Platform::Aix),
            other => Err(AgentError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Prefix used in output file names, e.g. `AIX_Perf_Monitor_<pid>`.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOs => "MacOS",
            Platform::Aix => "AIX",
        }
    }

    /// Probes run once before the first collection cycle.
    pub fn info_probes(&self) -> ProbeSet {
        match self {
            Platform::Linux => linux::info_probes(),
            Platform::MacOs => macos::info_probes(),
            Platform::Aix => aix::info_probes(),
        }
    }

    /// Probes run on every collection cycle.
    pub fn collection_probes(&self) -> ProbeSet {
        match self {
            Platform::Linux => linux::collection_probes(),
            Platform::MacOs => macos::collection_probes(),
            Platform::Aix => aix::collection_probes(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
