//! Connectors for the source and destination vector databases.

pub mod common;
pub mod pinecone;
pub mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::{DestinationConfig, DistanceMetric, SourceConfig};
use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::transform::to_points;

/// A record read from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Source identifier.
    pub id: String,
    /// Vector embedding.
    #[serde(rename = "values")]
    pub vector: Vec<f32>,
    /// Metadata attached to the vector.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Name and schema of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Collection/index name.
    pub name: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Distance metric.
    pub metric: DistanceMetric,
}

/// A point in the destination's native shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Integer point id.
    pub id: u64,
    /// Vector embedding.
    pub vector: Vec<f32>,
    /// Payload object.
    pub payload: serde_json::Value,
}

/// Status of a destination write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// Received but not yet applied.
    Acknowledged,
    /// Durably applied.
    Completed,
    /// Anything else the destination reports.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acknowledged => f.write_str("acknowledged"),
            Self::Completed => f.write_str("completed"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Acknowledgment returned by a destination write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    /// Destination operation id, if reported.
    #[serde(default)]
    pub operation_id: Option<u64>,
    /// Write status.
    pub status: UpdateStatus,
}

/// Source side of a migration.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Get the source type name.
    fn source_type(&self) -> &'static str;

    /// Opens the named index and returns its schema.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the index does not exist,
    /// [`Error::InvalidDimension`] if its dimension is unusable.
    async fn open(&mut self, name: &str) -> Result<CollectionDescriptor>;

    /// Fetches records by id.
    ///
    /// Ids unknown to the source are absent from the returned map.
    async fn fetch_batch(&self, ids: &[String]) -> Result<HashMap<String, Record>>;
}

/// Destination side of a migration.
#[async_trait]
pub trait DestinationWriter: Send + Sync {
    /// Get the destination type name.
    fn destination_type(&self) -> &'static str;

    /// Drops any collection with this name and creates it empty.
    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<()>;

    /// Writes points and waits for the destination to apply them.
    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<WriteAck>;

    /// Exact number of points in the collection.
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Reads points back by id, with vectors and payloads.
    ///
    /// Unknown ids are absent from the result.
    async fn retrieve(&self, collection: &str, ids: &[u64]) -> Result<Vec<Point>>;
}

/// Converts `records` and writes them as one batch.
///
/// `offset` is the position of the batch's first identifier in the full
/// enumeration; it seeds synthetic ids for non-numeric identifiers.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] before anything is sent if a vector has the
/// wrong length, [`Error::UpsertIncomplete`] if the write is not completed.
pub async fn write_batch(
    writer: &dyn DestinationWriter,
    descriptor: &CollectionDescriptor,
    records: &[(usize, Record)],
    offset: usize,
) -> Result<WriteAck> {
    let points = to_points(records, offset, descriptor.dimension)?;
    let ack = writer.upsert(&descriptor.name, points).await?;

    if ack.status != UpdateStatus::Completed {
        return Err(Error::UpsertIncomplete {
            collection: descriptor.name.clone(),
            status: ack.status.to_string(),
        });
    }

    Ok(ack)
}

/// Create a source reader from configuration.
pub fn create_reader(
    config: &SourceConfig,
    credentials: &dyn CredentialProvider,
) -> Result<Box<dyn SourceReader>> {
    match config {
        SourceConfig::Pinecone(cfg) => Ok(Box::new(pinecone::PineconeReader::from_credentials(
            cfg.clone(),
            credentials,
        )?)),
    }
}

/// Create a destination writer from configuration.
pub fn create_writer(
    config: &DestinationConfig,
    credentials: &dyn CredentialProvider,
) -> Result<Box<dyn DestinationWriter>> {
    match config {
        DestinationConfig::Qdrant(cfg) => Ok(Box::new(qdrant::QdrantWriter::from_credentials(
            cfg.clone(),
            credentials,
        )?)),
    }
}
