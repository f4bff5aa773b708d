use async_trait::async_trait;
use elasticsearch::{
    auth::Credentials,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    Elasticsearch, IndexParts,
};
use log::{debug, error};
use serde_json::{json, Value};
use url::Url;
use crate::engine::models::CycleReport;
use crate::shared::error::SinkError;
use crate::shared::storage::ReportDocument;
use crate::shared::traits::ReportSink;

/// Indexes each cycle report as one document.
pub struct ElasticsearchSink {
    client: Elasticsearch,
    index: String,
    host: String,
}

impl ElasticsearchSink {
    pub fn new(
        es_host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        index: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Self, SinkError> {
        let url = Url::parse(&format!("http://{}:{}", es_host, port))
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(conn_pool);

        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.auth(Credentials::Basic(
                username.to_string(),
                password.to_string(),
            ));
        }

        let transport = builder
            .build()
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            index: index.into(),
            host: host.into(),
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }
}

#[async_trait]
impl ReportSink for ElasticsearchSink {
    async fn deliver(&self, report: &CycleReport) -> Result<(), SinkError> {
        let document = ReportDocument::new(&self.host, report);
        let id = report.id.to_string();

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index, &id))
            .body(json!(document))
            .send()
            .await
            .map_err(|e| SinkError::Store(e.to_string()))?;

        if !response.status_code().is_success() {
            error!("Failed to index cycle {}: {:?}", report.sequence, response);
            return Err(SinkError::Store(format!(
                "Elasticsearch returned error status: {}",
                response.status_code()
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SinkError::Store(e.to_string()))?;

        debug!("Indexed cycle {}: {:?}", report.sequence, response_body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_without_connecting() {
        let sink = ElasticsearchSink::new("localhost", 9200, Some("u"), Some("p"), "perfmon_cycles", "host-a")
            .unwrap();
        assert_eq!(sink.index(), "perfmon_cycles");
    }

    #[test]
    fn rejects_unparseable_host() {
        let err = ElasticsearchSink::new("bad host", 9200, None, None, "perfmon_cycles", "host-a");
        assert!(matches!(err, Err(SinkError::Connection(_))));
    }
}
