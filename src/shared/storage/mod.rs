pub mod elasticsearch_storage;
pub mod file_storage;

pub use elasticsearch_storage::ElasticsearchSink;
pub use file_storage::FileSink;

use log::info;
use serde::Serialize;
use std::sync::Arc;
use crate::engine::models::CycleReport;
use crate::features::platform::Platform;
use crate::shared::config::SinkConfig;
use crate::shared::error::SinkError;
use crate::shared::traits::ReportSink;

/// Stored form of a report: the report itself plus the host it came from.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub host: &'a str,
    #[serde(flatten)]
    pub report: &'a CycleReport,
}

impl<'a> ReportDocument<'a> {
    pub fn new(host: &'a str, report: &'a CycleReport) -> Self {
        Self { host, report }
    }
}

pub fn build_sink(config: &SinkConfig, platform: Platform) -> Result<Arc<dyn ReportSink>, SinkError> {
    let host = whoami::hostname();
    match config {
        SinkConfig::File { path } => {
            let path = path.clone().unwrap_or_else(|| FileSink::default_path(platform));
            info!("Writing cycle reports to {}", path.display());
            Ok(Arc::new(FileSink::new(path, host)))
        }
        SinkConfig::Elasticsearch {
            host: es_host,
            port,
            username,
            password,
            index,
        } => {
            info!("Connecting to Elasticsearch at {}:{}", es_host, port);
            Ok(Arc::new(ElasticsearchSink::new(
                es_host,
                *port,
                username.as_deref(),
                password.as_deref(),
                index.clone(),
                host,
            )?))
        }
    }
}
