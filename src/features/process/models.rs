use serde::{Deserialize, Serialize};
use crate::engine::models::Payload;
use crate::shared::traits::Validatable;

/// Processes above this CPU share are counted as high-CPU.
pub const HIGH_CPU_PERCENT: f32 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub cpu_usage: f32,
    pub memory_usage: u64,
    /// Share of total physical memory, 0 when the total is unknown.
    pub memory_percent: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessScan {
    pub processes: Vec<ProcessSnapshot>,
}

impl ProcessScan {
    pub fn high_cpu(&self) -> impl Iterator<Item = &ProcessSnapshot> {
        self.processes
            .iter()
            .filter(|p| p.cpu_usage > HIGH_CPU_PERCENT)
    }

    pub fn top_cpu(&self) -> Option<&ProcessSnapshot> {
        self.processes
            .iter()
            .max_by(|a, b| a.cpu_usage.total_cmp(&b.cpu_usage))
    }
}

impl Validatable for ProcessScan {
    fn validate(&self) -> Result<(), String> {
        if let Some(p) = self.processes.iter().find(|p| p.cpu_usage < 0.0) {
            return Err(format!("CPU usage of pid {} cannot be negative", p.pid));
        }
        Ok(())
    }
}

/// Each high-CPU process adds `process_cpu_percent:<pid>:<name>` and
/// `process_memory_percent:<pid>:<name>` next to the summary fields.
impl From<ProcessScan> for Payload {
    fn from(scan: ProcessScan) -> Self {
        let mut fields = vec![
            ("process_count".to_string(), scan.processes.len() as f64),
            ("high_cpu_process_count".to_string(), scan.high_cpu().count() as f64),
            (
                "top_process_cpu_percent".to_string(),
                scan.top_cpu().map_or(0.0, |p| p.cpu_usage as f64),
            ),
        ];
        for p in scan.high_cpu() {
            fields.push((format!("process_cpu_percent:{}:{}", p.pid, p.name), p.cpu_usage as f64));
            fields.push((format!("process_memory_percent:{}:{}", p.pid, p.name), p.memory_percent as f64));
        }
        Payload::metrics(fields)
    }
}
