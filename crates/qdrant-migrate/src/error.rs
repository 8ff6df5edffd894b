//! Error types for qdrant-migrate.

use thiserror::Error;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while migrating.
///
/// Every variant is fatal: nothing is retried and nothing is downgraded to a
/// warning.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration or a credential that cannot be obtained.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested source index does not exist.
    #[error("Source index '{0}' not found")]
    NotFound(String),

    /// The source reported a missing or non-positive dimension.
    #[error("Invalid dimension for '{collection}': {reason}")]
    InvalidDimension {
        /// Collection/index name.
        collection: String,
        /// What was wrong with the reported value.
        reason: String,
    },

    /// A vector does not match the collection dimension.
    #[error("Vector dimension mismatch for record '{id}': expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Source record id.
        id: String,
        /// Collection dimension.
        expected: usize,
        /// Vector length.
        actual: usize,
    },

    /// Two records of one batch map onto the same destination id.
    #[error("Records '{first}' and '{second}' both map to point id {point_id}")]
    DuplicatePointId {
        /// Destination id.
        point_id: u64,
        /// Source id converted first.
        first: String,
        /// Source id converted second.
        second: String,
    },

    /// The destination did not acknowledge a write as completed.
    #[error("Upsert incomplete for collection '{collection}': status {status}")]
    UpsertIncomplete {
        /// Destination collection.
        collection: String,
        /// Status reported by the destination.
        status: String,
    },

    /// Authentication rejected by a remote service.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Source service error.
    #[error("Source connection error: {0}")]
    SourceConnection(String),

    /// Destination service error.
    #[error("Destination connection error: {0}")]
    DestinationConnection(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
