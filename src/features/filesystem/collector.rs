use async_trait::async_trait;
use std::path::PathBuf;
use crate::engine::models::{Payload, ProbeContext, ProbeKind};
use crate::features::filesystem::models::parse_mount_table;
use crate::shared::error::ProbeFailure;
use crate::shared::traits::Probe;

pub const PROC_MOUNTS: &str = "/proc/mounts";

/// Lists NFS mounts from a mount table file.
pub struct NfsMountsProbe {
    kind: ProbeKind,
    mount_table: PathBuf,
}

impl NfsMountsProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self::with_mount_table(kind, PROC_MOUNTS)
    }

    pub fn with_mount_table(kind: ProbeKind, mount_table: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            mount_table: mount_table.into(),
        }
    }
}

#[async_trait]
impl Probe for NfsMountsProbe {
    fn name(&self) -> &str {
        "nfs_mounts"
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        let content = match tokio::fs::read_to_string(&self.mount_table).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProbeFailure::Unavailable(format!(
                    "{} does not exist",
                    self.mount_table.display()
                )))
            }
            Err(e) => return Err(ProbeFailure::ExecutionFailed(e.to_string())),
        };

        let nfs: Vec<String> = parse_mount_table(&content)
            .into_iter()
            .filter(|m| m.is_nfs())
            .map(|m| format!("{} on {} type {} ({})", m.device, m.mount_point, m.file_system, m.options))
            .collect();

        if nfs.is_empty() {
            return Ok(Payload::Text("No NFS mounts found.".to_string()));
        }
        Ok(Payload::Text(format!("NFS Mounts:\n{}", nfs.join("\n"))))
    }
}
