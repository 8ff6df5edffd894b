//! Configuration types for qdrant-migrate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::batch::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::error::{Error, Result};

/// Main migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Source database configuration.
    pub source: SourceConfig,
    /// Destination database configuration.
    pub destination: DestinationConfig,
    /// Identifiers to migrate, as `list:`, `file:` or `range:`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub ids: IdSource,
    /// Migration options.
    #[serde(default)]
    pub options: MigrationOptions,
}

/// Source database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceConfig {
    /// Pinecone index.
    #[serde(rename = "pinecone")]
    Pinecone(PineconeConfig),
}

impl SourceConfig {
    /// Name of the source index.
    pub fn index_name(&self) -> &str {
        match self {
            Self::Pinecone(cfg) => &cfg.index,
        }
    }
}

/// Pinecone configuration.
///
/// The API key and environment are resolved through the credential provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    /// Index name.
    pub index: String,
    /// Optional namespace.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Control plane URL override. Defaults to
    /// `https://controller.{environment}.pinecone.io`.
    #[serde(default)]
    pub controller_url: Option<String>,
}

/// Destination database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DestinationConfig {
    /// Qdrant collection.
    #[serde(rename = "qdrant")]
    Qdrant(QdrantConfig),
}

impl DestinationConfig {
    /// Configured collection name, if any.
    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::Qdrant(cfg) => cfg.collection.as_deref(),
        }
    }

    /// Configured distance metric.
    pub fn metric(&self) -> DistanceMetric {
        match self {
            Self::Qdrant(cfg) => cfg.metric,
        }
    }
}

/// How to reach Qdrant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QdrantMode {
    /// Local server, no API key.
    #[default]
    Local,
    /// Managed cluster; URL and API key come from the credential provider.
    Cloud,
}

/// Qdrant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Connection mode.
    #[serde(default)]
    pub mode: QdrantMode,
    /// Server URL for local mode.
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    /// Collection name (defaults to the source index name).
    #[serde(default)]
    pub collection: Option<String>,
    /// Distance metric.
    #[serde(default)]
    pub metric: DistanceMetric,
}

/// Distance metric of the destination collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity (default).
    #[default]
    Cosine,
    /// Euclidean distance.
    #[serde(alias = "euclidean")]
    Euclid,
    /// Dot product.
    Dot,
    /// Manhattan distance.
    Manhattan,
}

impl DistanceMetric {
    /// Name used by the Qdrant API.
    pub fn as_qdrant(&self) -> &'static str {
        match self {
            Self::Cosine => "Cosine",
            Self::Euclid => "Euclid",
            Self::Dot => "Dot",
            Self::Manhattan => "Manhattan",
        }
    }
}

/// Largest number of ids a `range` may expand to.
pub const MAX_RANGE_IDS: u64 = 10_000_000;

/// Where the identifiers to migrate come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdSource {
    /// Inline list.
    List(Vec<String>),
    /// Text file, one id per line. Blank lines are ignored.
    File(PathBuf),
    /// Numeric ids `start..=end`, at most [`MAX_RANGE_IDS`] of them.
    Range {
        /// First id.
        start: u64,
        /// Last id, inclusive.
        end: u64,
    },
}

impl IdSource {
    fn check_range(start: u64, end: u64) -> Result<()> {
        if start > end {
            return Err(Error::Config(format!(
                "ids range start {start} is after end {end}"
            )));
        }
        if (end - start).saturating_add(1) > MAX_RANGE_IDS {
            return Err(Error::Config(format!(
                "ids range {start}..={end} exceeds {MAX_RANGE_IDS} ids"
            )));
        }
        Ok(())
    }

    /// Materializes the ids in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the id file cannot be read or the range is
    /// reversed or too large.
    pub fn load(&self) -> Result<Vec<String>> {
        match self {
            Self::List(ids) => Ok(ids.clone()),
            Self::File(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read id file '{}': {}", path.display(), e))
                })?;
                Ok(content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect())
            }
            Self::Range { start, end } => {
                Self::check_range(*start, *end)?;
                Ok((*start..=*end).map(|i| i.to_string()).collect())
            }
        }
    }
}

/// Migration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Batch size for fetching and writing.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Dry run mode (read and transform only).
    #[serde(default)]
    pub dry_run: bool,
    /// Compare the destination point count after the run.
    #[serde(default)]
    pub verify: bool,
    /// Write fetched records to this JSON file.
    #[serde(default)]
    pub dump_path: Option<PathBuf>,
    /// Show a progress bar.
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            dry_run: false,
            verify: false,
            dump_path: None,
            progress: true,
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_true() -> bool {
    true
}

impl MigrationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Destination collection name.
    pub fn collection_name(&self) -> &str {
        self.destination
            .collection()
            .unwrap_or_else(|| self.source.index_name())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.options.batch_size == 0 || self.options.batch_size > MAX_BATCH_SIZE {
            return Err(Error::Config(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }
        if self.source.index_name().is_empty() {
            return Err(Error::Config("source index cannot be empty".to_string()));
        }
        if self.collection_name().is_empty() {
            return Err(Error::Config(
                "collection name cannot be empty".to_string(),
            ));
        }
        match &self.ids {
            IdSource::List(ids) if ids.is_empty() => {
                return Err(Error::Config("ids list cannot be empty".to_string()));
            }
            IdSource::Range { start, end } => IdSource::check_range(*start, *end)?,
            _ => {}
        }
        Ok(())
    }
}
