//! Qdrant destination connector (REST API).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{QdrantConfig, QdrantMode};
use crate::connectors::common::{check_response, create_http_client, join_url, validate_url};
use crate::connectors::{CollectionDescriptor, DestinationWriter, Point, WriteAck};
use crate::credentials::{CredentialProvider, QDRANT_API_KEY, QDRANT_URL};
use crate::error::{Error, Result};

const SERVICE: &str = "Qdrant";

/// Envelope around every Qdrant response.
#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    vectors: VectorParams<'a>,
}

#[derive(Debug, Serialize)]
struct VectorParams<'a> {
    size: usize,
    distance: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    ids: &'a [u64],
    with_payload: bool,
    with_vector: bool,
}

#[derive(Debug, Deserialize)]
struct RetrievedPoint {
    id: u64,
    #[serde(default)]
    vector: Vec<f32>,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Qdrant collection writer.
pub struct QdrantWriter {
    url: String,
    api_key: Option<String>,
    client: Client,
}

impl QdrantWriter {
    /// Creates a writer for `url`.
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let url = url.into();
        validate_url(&url)?;
        Ok(Self {
            url,
            api_key,
            client: create_http_client(),
        })
    }

    /// Creates a writer from config; cloud mode resolves `QDRANT_URL` and
    /// `QDRANT_API_KEY`.
    pub fn from_credentials(
        config: QdrantConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self> {
        match config.mode {
            QdrantMode::Local => Self::new(config.url, None),
            QdrantMode::Cloud => {
                let url = credentials.resolve(QDRANT_URL)?;
                let api_key = credentials.resolve(QDRANT_API_KEY)?;
                Self::new(url, Some(api_key))
            }
        }
    }

    fn collection_url(&self, collection: &str, suffix: &str) -> String {
        join_url(&self.url, &format!("collections/{collection}{suffix}"))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        self.request(builder)
            .send()
            .await
            .map_err(|e| Error::DestinationConnection(format!("Qdrant request failed: {}", e)))
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        let url = self.collection_url(collection, "");
        let response = self.send(self.client.delete(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Collection '{}' did not exist", collection);
            return Ok(());
        }
        check_response(response, SERVICE, false).await?;
        Ok(())
    }
}

#[async_trait]
impl DestinationWriter for QdrantWriter {
    fn destination_type(&self) -> &'static str {
        "qdrant"
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<()> {
        self.delete_collection(&descriptor.name).await?;

        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: descriptor.dimension,
                distance: descriptor.metric.as_qdrant(),
            },
        };
        let url = self.collection_url(&descriptor.name, "");
        let response = self.send(self.client.put(&url).json(&body)).await?;
        check_response(response, SERVICE, false).await?;

        info!(
            "Created Qdrant collection '{}' ({}D, {})",
            descriptor.name,
            descriptor.dimension,
            descriptor.metric.as_qdrant()
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<WriteAck> {
        let url = self.collection_url(collection, "/points");
        let count = points.len();
        let body = UpsertRequest { points };

        let response = self
            .send(self.client.put(&url).query(&[("wait", "true")]).json(&body))
            .await?;
        let response = check_response(response, SERVICE, false).await?;
        let parsed: QdrantResponse<WriteAck> = response.json().await.map_err(|e| {
            Error::DestinationConnection(format!("Failed to parse upsert response: {}", e))
        })?;

        debug!(
            "Upserted {} points into '{}': {}",
            count, collection, parsed.result.status
        );
        Ok(parsed.result)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let url = self.collection_url(collection, "/points/count");
        let response = self
            .send(self.client.post(&url).json(&serde_json::json!({ "exact": true })))
            .await?;
        let response = check_response(response, SERVICE, false).await?;
        let parsed: QdrantResponse<CountResult> = response.json().await.map_err(|e| {
            Error::DestinationConnection(format!("Failed to parse count response: {}", e))
        })?;
        Ok(parsed.result.count)
    }

    async fn retrieve(&self, collection: &str, ids: &[u64]) -> Result<Vec<Point>> {
        let url = self.collection_url(collection, "/points");
        let body = RetrieveRequest {
            ids,
            with_payload: true,
            with_vector: true,
        };
        let response = self.send(self.client.post(&url).json(&body)).await?;
        let response = check_response(response, SERVICE, false).await?;
        let parsed: QdrantResponse<Vec<RetrievedPoint>> = response.json().await.map_err(|e| {
            Error::DestinationConnection(format!("Failed to parse retrieve response: {}", e))
        })?;

        Ok(parsed
            .result
            .into_iter()
            .map(|p| Point {
                id: p.id,
                vector: p.vector,
                payload: p.payload,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "qdrant_tests.rs"]
mod tests;
