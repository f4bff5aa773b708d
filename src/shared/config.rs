use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::engine::alert::AlertThresholds;
use crate::engine::registry::TimeoutPolicy;
use crate::engine::scheduler::Schedule;
use crate::features::platform::Platform;
use crate::shared::error::ConfigError;
use crate::shared::traits::Validatable;

pub const DEFAULT_CONFIG_PATH: &str = "config/agent.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub interval_secs: u64,
    /// `null` runs until a shutdown signal arrives.
    pub total_duration_secs: Option<u64>,
    pub probe_timeout_secs: u64,
    pub probe_timeouts: HashMap<String, u64>,
    pub max_workers: usize,
    pub alert_thresholds: BTreeMap<String, f64>,
    pub platform: Option<Platform>,
    pub sink: SinkConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            total_duration_secs: Some(60),
            probe_timeout_secs: 60,
            probe_timeouts: HashMap::new(),
            max_workers: 8,
            alert_thresholds: BTreeMap::from([
                ("cpu_percent".to_string(), 90.0),
                ("memory_percent".to_string(), 90.0),
            ]),
            platform: None,
            sink: SinkConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    File {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Elasticsearch {
        host: String,
        #[serde(default = "default_es_port")]
        port: u16,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default = "default_es_index")]
        index: String,
    },
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::File { path: None }
    }
}

fn default_es_port() -> u16 {
    9200
}

fn default_es_index() -> String {
    "perfmon_cycles".to_string()
}

impl AgentConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Reading config from: {}", path.display());
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Loads `path` if given, otherwise the default location. Only a missing
    /// default file is tolerated.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::load(DEFAULT_CONFIG_PATH) {
                Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    warn!("No config at {}, using built-in defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
                other => other,
            },
        }
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            interval: Duration::from_secs(self.interval_secs),
            total_duration: self.total_duration_secs.map(Duration::from_secs),
        }
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy {
            default: Duration::from_secs(self.probe_timeout_secs),
            overrides: self
                .probe_timeouts
                .iter()
                .map(|(name, secs)| (name.clone(), Duration::from_secs(*secs)))
                .collect(),
        }
    }

    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds::from_limits(
            self.alert_thresholds
                .iter()
                .map(|(metric, limit)| (metric.as_str(), *limit)),
        )
    }
}

impl Validatable for AgentConfig {
    fn validate(&self) -> Result<(), String> {
        if self.interval_secs == 0 {
            return Err("interval_secs must be greater than zero".to_string());
        }
        if self.probe_timeout_secs == 0 {
            return Err("probe_timeout_secs must be greater than zero".to_string());
        }
        if let Some((name, _)) = self.probe_timeouts.iter().find(|(_, secs)| **secs == 0) {
            return Err(format!("probe_timeouts.{} must be greater than zero", name));
        }
        if self.max_workers == 0 {
            return Err("max_workers must be at least 1".to_string());
        }
        if let Some((metric, _)) = self.alert_thresholds.iter().find(|(_, limit)| !limit.is_finite()) {
            return Err(format!("alert_thresholds.{} must be a finite number", metric));
        }
        Ok(())
    }
}
