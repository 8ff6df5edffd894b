// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # qdrant-migrate
//!
//! `qdrant-migrate` is a CLI tool and library for copying vectors out of a
//! Pinecone index into a Qdrant collection.
//!
//! The destination collection is recreated from the source's declared
//! dimension, then records are fetched by id in bounded batches, mapped to
//! Qdrant points and upserted with `wait=true`. Every batch must be
//! acknowledged as completed before the next one starts; the first failure
//! stops the run, leaving earlier batches in place.
//!
//! ## Quick Start
//!
//! ```bash
//! qdrant-migrate run --config migration.yaml
//!
//! # Dry run (read and transform only)
//! qdrant-migrate run --config migration.yaml --dry-run
//! ```
//!
//! ## Configuration Example
//!
//! ```yaml
//! source:
//!   type: pinecone
//!   index: example-index
//!
//! destination:
//!   type: qdrant
//!   mode: cloud
//!   metric: cosine
//!
//! ids:
//!   range: {start: 1, end: 10000}
//!
//! options:
//!   batch_size: 1000
//! ```
//!
//! Credentials (`PINECONE_API_KEY`, `PINECONE_ENVIRONMENT`, `QDRANT_URL`,
//! `QDRANT_API_KEY`) are read from the environment and prompted for when
//! missing.

#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod connectors;
pub mod credentials;
pub mod dump;
pub mod error;
pub mod pipeline;
pub mod transform;

pub use config::{MigrationConfig, MigrationOptions, SourceConfig};
pub use connectors::{CollectionDescriptor, DestinationWriter, Point, Record, SourceReader};
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use error::{Error, Result};
pub use pipeline::{migrate, Migration, MigrationState, MigrationStats};
