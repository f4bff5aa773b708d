use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use crate::engine::models::CycleReport;
use crate::features::platform::Platform;
use crate::shared::error::SinkError;
use crate::shared::storage::ReportDocument;
use crate::shared::traits::ReportSink;

/// Appends one JSON document per report to a local file.
pub struct FileSink {
    path: PathBuf,
    host: String,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            host: host.into(),
        }
    }

    /// `/tmp/<Platform>_Perf_Monitor_<pid>.jsonl`
    pub fn default_path(platform: Platform) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{}_Perf_Monitor_{}.jsonl",
            platform.label(),
            std::process::id()
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSink for FileSink {
    async fn deliver(&self, report: &CycleReport) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&ReportDocument::new(&self.host, report))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        debug!("Appended cycle {} to {}", report.sequence, self.path.display());
        Ok(())
    }
}
