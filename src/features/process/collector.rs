use async_trait::async_trait;
use log::warn;
use sysinfo::{ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL};
use crate::engine::models::{Payload, ProbeContext, ProbeKind};
use crate::features::process::models::{ProcessScan, ProcessSnapshot};
use crate::features::system_metrics::{sample_blocking, CPU_SAMPLE_WINDOW};
use crate::shared::error::ProbeFailure;
use crate::shared::traits::Probe;

pub struct ProcessScanProbe {
    kind: ProbeKind,
}

impl ProcessScanProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self { kind }
    }

    fn sample() -> ProcessScan {
        let mut sys = System::new();
        // Per-process CPU usage needs two refreshes spaced apart.
        sys.refresh_processes(ProcessesToUpdate::All, true);
        std::thread::sleep(CPU_SAMPLE_WINDOW.max(MINIMUM_CPU_UPDATE_INTERVAL));
        sys.refresh_processes(ProcessesToUpdate::All, true);
        sys.refresh_memory();
        let total_memory = sys.total_memory();

        let processes: Vec<ProcessSnapshot> = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessSnapshot {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
                cpu_usage: process.cpu_usage(),
                memory_usage: process.memory(),
                memory_percent: percent_of(process.memory(), total_memory),
            })
            .collect();

        let scan = ProcessScan { processes };
        for p in scan.high_cpu() {
            warn!(
                "High CPU usage: PID {}, Name: {}, CPU: {:.1}%, Mem: {:.1}%",
                p.pid, p.name, p.cpu_usage, p.memory_percent
            );
        }
        scan
    }
}

fn percent_of(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0) as f32
}

#[async_trait]
impl Probe for ProcessScanProbe {
    fn name(&self) -> &str {
        "process_scan"
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        sample_blocking(Self::sample).await
    }
}
