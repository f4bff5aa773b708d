use serde::{Deserialize, Serialize};
use crate::engine::models::Payload;
use crate::shared::traits::Validatable;

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuMemorySample {
    pub cpu_usage: f32,
    pub total_memory: u64,
    pub used_memory: u64,
    pub available_memory: u64,
}

impl CpuMemorySample {
    pub fn memory_percent(&self) -> f64 {
        percent(self.used_memory, self.total_memory)
    }
}

impl Validatable for CpuMemorySample {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.cpu_usage) {
            return Err(format!("CPU usage {} is outside 0..=100", self.cpu_usage));
        }
        if self.total_memory == 0 {
            return Err("Total memory cannot be zero".to_string());
        }
        if self.used_memory > self.total_memory {
            return Err("Used memory cannot exceed total memory".to_string());
        }
        Ok(())
    }
}

impl From<CpuMemorySample> for Payload {
    fn from(sample: CpuMemorySample) -> Self {
        Payload::metrics([
            ("cpu_percent", sample.cpu_usage as f64),
            ("memory_percent", sample.memory_percent()),
            ("memory_total_gb", gb(sample.total_memory)),
            ("memory_used_gb", gb(sample.used_memory)),
            ("memory_available_gb", gb(sample.available_memory)),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapSample {
    pub total_swap: u64,
    pub used_swap: u64,
    pub free_swap: u64,
}

impl Validatable for SwapSample {
    fn validate(&self) -> Result<(), String> {
        if self.used_swap > self.total_swap {
            return Err("Used swap cannot exceed total swap".to_string());
        }
        Ok(())
    }
}

impl From<SwapSample> for Payload {
    fn from(sample: SwapSample) -> Self {
        Payload::metrics([
            ("swap_total_gb", gb(sample.total_swap)),
            ("swap_used_gb", gb(sample.used_swap)),
            ("swap_free_gb", gb(sample.free_swap)),
            ("swap_percent", percent(sample.used_swap, sample.total_swap)),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskUsage {
    pub mount_point: String,
    pub total_space: u64,
    pub available_space: u64,
}

impl DiskUsage {
    pub fn used_percent(&self) -> f64 {
        percent(
            self.total_space.saturating_sub(self.available_space),
            self.total_space,
        )
    }
}

impl Validatable for DiskUsage {
    fn validate(&self) -> Result<(), String> {
        if self.available_space > self.total_space {
            return Err(format!(
                "Available space cannot exceed total space for {}",
                self.mount_point
            ));
        }
        Ok(())
    }
}

/// All mounts with a non-zero size. An empty list is a valid sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskUsageSample {
    pub disks: Vec<DiskUsage>,
}

impl Validatable for DiskUsageSample {
    fn validate(&self) -> Result<(), String> {
        self.disks.iter().try_for_each(Validatable::validate)
    }
}

impl From<DiskUsageSample> for Payload {
    fn from(sample: DiskUsageSample) -> Self {
        let mut fields: Vec<(String, f64)> = sample
            .disks
            .iter()
            .map(|d| (format!("disk_used_percent:{}", d.mount_point), d.used_percent()))
            .collect();
        if let Some(max) = sample
            .disks
            .iter()
            .map(DiskUsage::used_percent)
            .reduce(f64::max)
        {
            fields.push(("disk_used_percent".to_string(), max));
        }
        Payload::metrics(fields)
    }
}
