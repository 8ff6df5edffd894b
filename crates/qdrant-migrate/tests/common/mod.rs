//! In-memory source and destination used by the migration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use qdrant_migrate::config::{DistanceMetric, MigrationOptions};
use qdrant_migrate::connectors::{UpdateStatus, WriteAck};
use qdrant_migrate::{
    CollectionDescriptor, DestinationWriter, Error, Migration, Point, Record, Result, SourceReader,
};

pub fn record(id: &str, vector: Vec<f32>, text: &str) -> Record {
    Record {
        id: id.to_string(),
        vector,
        metadata: json!({ "text": text }).as_object().cloned().unwrap(),
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Source backed by a map.
pub struct MemorySource {
    pub index: String,
    pub dimension: Option<serde_json::Value>,
    pub records: HashMap<String, Record>,
    pub fetch_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MemorySource {
    pub fn new(index: &str, dimension: usize, records: Vec<Record>) -> Self {
        Self {
            index: index.to_string(),
            dimension: Some(json!(dimension)),
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
            fetch_calls: Arc::default(),
        }
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    fn source_type(&self) -> &'static str {
        "memory"
    }

    async fn open(&mut self, name: &str) -> Result<CollectionDescriptor> {
        if name != self.index {
            return Err(Error::NotFound(name.to_string()));
        }
        let dimension = match self.dimension.as_ref().and_then(|d| d.as_u64()) {
            Some(d) if d > 0 => d as usize,
            _ => {
                return Err(Error::InvalidDimension {
                    collection: name.to_string(),
                    reason: "not a positive integer".to_string(),
                })
            }
        };
        Ok(CollectionDescriptor {
            name: name.to_string(),
            dimension,
            metric: DistanceMetric::Cosine,
        })
    }

    async fn fetch_batch(&self, ids: &[String]) -> Result<HashMap<String, Record>> {
        self.fetch_calls.lock().unwrap().push(ids.to_vec());
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }
}

/// A stored collection.
#[derive(Debug, Clone)]
pub struct StoredCollection {
    pub descriptor: CollectionDescriptor,
    pub points: BTreeMap<u64, Point>,
}

#[derive(Debug, Default)]
pub struct DestinationState {
    pub collections: HashMap<String, StoredCollection>,
    pub upsert_calls: usize,
    /// Status reported for the n-th upsert call (1-based), without applying it.
    pub fail_on_call: Option<(usize, UpdateStatus)>,
}

/// Destination keeping collections in shared memory.
#[derive(Clone, Default)]
pub struct MemoryDestination {
    pub state: Arc<Mutex<DestinationState>>,
}

impl MemoryDestination {
    pub fn failing_on(call: usize, status: UpdateStatus) -> Self {
        let dest = Self::default();
        dest.state.lock().unwrap().fail_on_call = Some((call, status));
        dest
    }

    pub fn collection(&self, name: &str) -> Option<StoredCollection> {
        self.state.lock().unwrap().collections.get(name).cloned()
    }
}

#[async_trait]
impl DestinationWriter for MemoryDestination {
    fn destination_type(&self) -> &'static str {
        "memory"
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<()> {
        self.state.lock().unwrap().collections.insert(
            descriptor.name.clone(),
            StoredCollection {
                descriptor: descriptor.clone(),
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<WriteAck> {
        let mut state = self.state.lock().unwrap();
        state.upsert_calls += 1;
        let call = state.upsert_calls;

        if let Some((fail_call, status)) = &state.fail_on_call {
            if *fail_call == call {
                return Ok(WriteAck {
                    operation_id: Some(call as u64),
                    status: status.clone(),
                });
            }
        }

        let stored = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| Error::DestinationConnection(format!("no collection {collection}")))?;
        for point in &points {
            if point.vector.len() != stored.descriptor.dimension {
                return Err(Error::DestinationConnection("wrong vector size".to_string()));
            }
        }
        for point in points {
            stored.points.insert(point.id, point);
        }

        Ok(WriteAck {
            operation_id: Some(call as u64),
            status: UpdateStatus::Completed,
        })
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        Ok(self
            .collection(collection)
            .map_or(0, |c| c.points.len() as u64))
    }

    async fn retrieve(&self, collection: &str, ids: &[u64]) -> Result<Vec<Point>> {
        let Some(stored) = self.collection(collection) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| stored.points.get(id).cloned())
            .collect())
    }
}

pub fn options(batch_size: usize) -> MigrationOptions {
    MigrationOptions {
        batch_size,
        progress: false,
        ..Default::default()
    }
}

pub fn migration(
    source: MemorySource,
    destination: &MemoryDestination,
    options: MigrationOptions,
) -> Migration {
    let index = source.index.clone();
    Migration::new(
        Box::new(source),
        Box::new(destination.clone()),
        index,
        "docs",
        DistanceMetric::Cosine,
        options,
    )
}
