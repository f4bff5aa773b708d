use async_trait::async_trait;
use log::debug;
use sysinfo::Networks;
use crate::engine::models::{Payload, ProbeContext, ProbeKind};
use crate::features::network::models::{InterfaceCounters, NetworkCounters};
use crate::features::system_metrics::sample_blocking;
use crate::shared::error::ProbeFailure;
use crate::shared::traits::Probe;

pub struct NetworkCountersProbe {
    kind: ProbeKind,
}

impl NetworkCountersProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self { kind }
    }

    fn sample() -> NetworkCounters {
        let networks = Networks::new_with_refreshed_list();
        let interfaces: Vec<InterfaceCounters> = networks
            .iter()
            .map(|(interface_name, data)| InterfaceCounters {
                interface_name: interface_name.to_string(),
                received_bytes: data.total_received(),
                transmitted_bytes: data.total_transmitted(),
            })
            .collect();

        debug!("Found {} network interfaces", interfaces.len());
        NetworkCounters { interfaces }
    }
}

#[async_trait]
impl Probe for NetworkCountersProbe {
    fn name(&self) -> &str {
        "network_counters"
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        sample_blocking(Self::sample).await
    }
}
