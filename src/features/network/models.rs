use serde::{Deserialize, Serialize};
use crate::engine::models::Payload;
use crate::shared::traits::Validatable;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceCounters {
    pub interface_name: String,
    pub received_bytes: u64,
    pub transmitted_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkCounters {
    pub interfaces: Vec<InterfaceCounters>,
}

impl NetworkCounters {
    pub fn bytes_sent(&self) -> u64 {
        self.interfaces.iter().map(|i| i.transmitted_bytes).sum()
    }

    pub fn bytes_received(&self) -> u64 {
        self.interfaces.iter().map(|i| i.received_bytes).sum()
    }
}

impl Validatable for NetworkCounters {
    // A host may legitimately have no interfaces.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl From<NetworkCounters> for Payload {
    fn from(counters: NetworkCounters) -> Self {
        Payload::metrics([
            ("bytes_sent_mb", counters.bytes_sent() as f64 / BYTES_PER_MB),
            ("bytes_received_mb", counters.bytes_received() as f64 / BYTES_PER_MB),
            ("interface_count", counters.interfaces.len() as f64),
        ])
    }
}
