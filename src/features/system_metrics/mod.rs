mod collector;
mod models;

pub(crate) use collector::sample_blocking;
pub use collector::{CpuMemoryProbe, DiskUsageProbe, PagingProbe, CPU_SAMPLE_WINDOW};
pub use models::{
    CpuMemorySample,
    DiskUsage,
    DiskUsageSample,
    SwapSample,
    BYTES_PER_GB,
};
