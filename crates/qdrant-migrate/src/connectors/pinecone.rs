//! Pinecone source connector.
//!
//! Uses the control plane to locate the index host and the data plane for
//! statistics and fetch-by-id.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::{DistanceMetric, PineconeConfig};
use crate::connectors::common::{
    check_response, create_http_client, join_url, parse_dimension, validate_url, with_scheme,
};
use crate::connectors::{CollectionDescriptor, Record, SourceReader};
use crate::credentials::{CredentialProvider, PINECONE_API_KEY, PINECONE_ENVIRONMENT};
use crate::error::{Error, Result};

const SERVICE: &str = "Pinecone";

/// Control plane description of an index.
#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    database: DatabaseInfo,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Deserialize)]
struct DatabaseInfo {
    #[serde(default)]
    metric: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    ready: Option<bool>,
}

/// Data plane statistics.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    dimension: Option<serde_json::Value>,
    #[serde(default)]
    total_vector_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, Record>,
}

/// Pinecone index reader.
pub struct PineconeReader {
    config: PineconeConfig,
    api_key: String,
    environment: String,
    client: Client,
    host: Option<String>,
}

impl PineconeReader {
    /// Creates a reader with explicit credentials.
    pub fn new(config: PineconeConfig, api_key: String, environment: String) -> Self {
        Self {
            config,
            api_key,
            environment,
            client: create_http_client(),
            host: None,
        }
    }

    /// Creates a reader, resolving `PINECONE_API_KEY` and `PINECONE_ENVIRONMENT`.
    pub fn from_credentials(
        config: PineconeConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self> {
        let api_key = credentials.resolve(PINECONE_API_KEY)?;
        let environment = credentials.resolve(PINECONE_ENVIRONMENT)?;
        Ok(Self::new(config, api_key, environment))
    }

    /// Control plane base URL.
    fn controller_url(&self) -> String {
        self.config
            .controller_url
            .clone()
            .unwrap_or_else(|| format!("https://controller.{}.pinecone.io", self.environment))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("Accept", "application/json")
    }

    fn host(&self) -> Result<&str> {
        self.host
            .as_deref()
            .ok_or_else(|| Error::SourceConnection("Pinecone index not opened".to_string()))
    }

    async fn describe_index(&self, name: &str) -> Result<DescribeIndexResponse> {
        let base = self.controller_url();
        validate_url(&base)?;
        let url = join_url(&base, &format!("databases/{name}"));

        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::SourceConnection(format!("Pinecone request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(name.to_string()));
        }

        let response = check_response(response, SERVICE, true).await?;
        response
            .json()
            .await
            .map_err(|e| Error::SourceConnection(format!("Failed to parse index description: {}", e)))
    }

    async fn describe_index_stats(&self, host: &str) -> Result<IndexStats> {
        let url = join_url(host, "describe_index_stats");

        let response = self
            .request(self.client.post(&url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::SourceConnection(format!("Pinecone request failed: {}", e)))?;

        let response = check_response(response, SERVICE, true).await?;
        response
            .json()
            .await
            .map_err(|e| Error::SourceConnection(format!("Failed to parse index stats: {}", e)))
    }
}

fn parse_metric(metric: Option<&str>) -> DistanceMetric {
    match metric {
        Some("euclidean") => DistanceMetric::Euclid,
        Some("dotproduct") => DistanceMetric::Dot,
        _ => DistanceMetric::Cosine,
    }
}

#[async_trait]
impl SourceReader for PineconeReader {
    fn source_type(&self) -> &'static str {
        "pinecone"
    }

    async fn open(&mut self, name: &str) -> Result<CollectionDescriptor> {
        let description = self.describe_index(name).await?;

        if description.status.ready == Some(false) {
            debug!("Pinecone index '{}' reports not ready", name);
        }

        let host = description.status.host.ok_or_else(|| {
            Error::SourceConnection(format!("Pinecone index '{}' has no host", name))
        })?;
        let host = with_scheme(&host);

        let stats = self.describe_index_stats(&host).await?;
        let dimension = parse_dimension(stats.dimension.as_ref(), name)?;

        info!(
            "Opened Pinecone index '{}': {}D, metric {:?}, {:?} vectors",
            name, dimension, description.database.metric, stats.total_vector_count
        );

        self.host = Some(host);

        Ok(CollectionDescriptor {
            name: name.to_string(),
            dimension,
            metric: parse_metric(description.database.metric.as_deref()),
        })
    }

    async fn fetch_batch(&self, ids: &[String]) -> Result<HashMap<String, Record>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = join_url(self.host()?, "vectors/fetch");
        let mut query: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();
        if let Some(namespace) = &self.config.namespace {
            query.push(("namespace", namespace.as_str()));
        }

        let response = self
            .request(self.client.get(&url))
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::SourceConnection(format!("Pinecone request failed: {}", e)))?;

        let response = check_response(response, SERVICE, true).await?;
        let fetched: FetchResponse = response
            .json()
            .await
            .map_err(|e| Error::SourceConnection(format!("Failed to parse fetch response: {}", e)))?;

        debug!("Fetched {}/{} vectors", fetched.vectors.len(), ids.len());

        Ok(fetched.vectors)
    }
}

#[cfg(test)]
#[path = "pinecone_tests.rs"]
mod tests;
