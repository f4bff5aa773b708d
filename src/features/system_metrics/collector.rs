use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use sysinfo::{Disks, System, IS_SUPPORTED_SYSTEM, MINIMUM_CPU_UPDATE_INTERVAL};
use crate::engine::models::{Payload, ProbeContext, ProbeKind};
use crate::features::system_metrics::models::{
    CpuMemorySample, DiskUsage, DiskUsageSample, SwapSample,
};
use crate::shared::error::ProbeFailure;
use crate::shared::traits::{Probe, Validatable};

/// Window over which CPU usage is averaged.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Runs a blocking sysinfo sampler off the async workers and validates the
/// result before it becomes a payload.
pub(crate) async fn sample_blocking<T, F>(sampler: F) -> Result<Payload, ProbeFailure>
where
    F: FnOnce() -> T + Send + 'static,
    T: Validatable + Into<Payload> + Send + 'static,
{
    if !IS_SUPPORTED_SYSTEM {
        return Err(ProbeFailure::Unavailable(
            "sysinfo does not support this platform".to_string(),
        ));
    }

    let sample = tokio::task::spawn_blocking(sampler)
        .await
        .map_err(|e| ProbeFailure::ExecutionFailed(e.to_string()))?;
    sample.validate().map_err(ProbeFailure::ExecutionFailed)?;
    Ok(sample.into())
}

pub struct CpuMemoryProbe {
    kind: ProbeKind,
}

impl CpuMemoryProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self { kind }
    }

    fn sample() -> CpuMemorySample {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        std::thread::sleep(CPU_SAMPLE_WINDOW.max(MINIMUM_CPU_UPDATE_INTERVAL));
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        CpuMemorySample {
            cpu_usage: sys.global_cpu_usage(),
            total_memory: sys.total_memory(),
            used_memory: sys.used_memory(),
            available_memory: sys.available_memory(),
        }
    }
}

#[async_trait]
impl Probe for CpuMemoryProbe {
    fn name(&self) -> &str {
        "cpu_memory"
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        sample_blocking(Self::sample).await
    }
}

pub struct PagingProbe {
    kind: ProbeKind,
}

impl PagingProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Probe for PagingProbe {
    fn name(&self) -> &str {
        "paging"
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        sample_blocking(|| {
            let mut sys = System::new();
            sys.refresh_memory();
            SwapSample {
                total_swap: sys.total_swap(),
                used_swap: sys.used_swap(),
                free_swap: sys.free_swap(),
            }
        })
        .await
    }
}

pub struct DiskUsageProbe {
    kind: ProbeKind,
}

impl DiskUsageProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self { kind }
    }

    fn sample() -> DiskUsageSample {
        let disks = Disks::new_with_refreshed_list();
        let disks: Vec<DiskUsage> = disks
            .list()
            .iter()
            .filter(|disk| disk.total_space() > 0)
            .map(|disk| DiskUsage {
                mount_point: disk.mount_point().to_string_lossy().into_owned(),
                total_space: disk.total_space(),
                available_space: disk.available_space(),
            })
            .collect();

        debug!("Found {} disks", disks.len());
        DiskUsageSample { disks }
    }
}

#[async_trait]
impl Probe for DiskUsageProbe {
    fn name(&self) -> &str {
        "disk_usage"
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        sample_blocking(Self::sample).await
    }
}
