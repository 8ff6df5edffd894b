//! Migration pipeline orchestration.

use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::batch::{try_for_each_batch, MAX_BATCH_SIZE};
use crate::config::{DistanceMetric, MigrationConfig, MigrationOptions};
use crate::connectors::{
    create_reader, create_writer, write_batch, CollectionDescriptor, DestinationWriter,
    SourceReader,
};
use crate::credentials::CredentialProvider;
use crate::dump::RecordDump;
use crate::error::{Error, Result};

/// Lifecycle of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Nothing done yet.
    Init,
    /// Source opened and dimension known.
    SourceReady,
    /// Destination collection (re)created.
    DestinationReady,
    /// Batches are being copied.
    Migrating,
    /// Every batch was written and acknowledged.
    Done,
    /// Stopped on the first error. Batches written before it stay written.
    Failed,
}

impl MigrationState {
    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Migration statistics.
#[derive(Debug, Default, Clone)]
pub struct MigrationStats {
    /// Identifiers requested.
    pub requested: u64,
    /// Records found at the source.
    pub fetched: u64,
    /// Identifiers the source did not return.
    pub missing: u64,
    /// Points acknowledged by the destination.
    pub written: u64,
    /// Batches fully processed.
    pub batches: u64,
    /// Destination point count after the run, when verified.
    pub destination_count: Option<u64>,
    /// Dump file, when requested.
    pub dump_path: Option<PathBuf>,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationStats {
    /// Calculate throughput (points per second).
    #[must_use]
    pub fn throughput(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.written as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}

/// Copies records from a source index into a destination collection.
pub struct Migration {
    reader: Box<dyn SourceReader>,
    writer: Box<dyn DestinationWriter>,
    source_index: String,
    collection: String,
    metric: DistanceMetric,
    options: MigrationOptions,
    state: MigrationState,
    stats: MigrationStats,
}

impl Migration {
    /// Creates a migration from explicit parts.
    pub fn new(
        reader: Box<dyn SourceReader>,
        writer: Box<dyn DestinationWriter>,
        source_index: impl Into<String>,
        collection: impl Into<String>,
        metric: DistanceMetric,
        options: MigrationOptions,
    ) -> Self {
        Self {
            reader,
            writer,
            source_index: source_index.into(),
            collection: collection.into(),
            metric,
            options,
            state: MigrationState::Init,
            stats: MigrationStats::default(),
        }
    }

    /// Creates a migration from configuration, resolving credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential cannot be resolved or a URL is invalid.
    pub fn from_config(
        config: &MigrationConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self> {
        let reader = create_reader(&config.source, credentials)?;
        let writer = create_writer(&config.destination, credentials)?;

        Ok(Self::new(
            reader,
            writer,
            config.source.index_name(),
            config.collection_name(),
            config.destination.metric(),
            config.options.clone(),
        ))
    }

    /// Current state.
    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Statistics so far; after a failure they describe the committed part.
    pub fn stats(&self) -> &MigrationStats {
        &self.stats
    }

    fn transition(&mut self, next: MigrationState) {
        debug!("Migration state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run the migration over `ids`, in order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; the state is then
    /// [`MigrationState::Failed`].
    pub async fn run(&mut self, ids: &[String]) -> Result<MigrationStats> {
        let start = std::time::Instant::now();

        info!(
            "Starting migration of {} ids from '{}' to '{}'",
            ids.len(),
            self.source_index,
            self.collection
        );

        let result = self.execute(ids).await;
        self.stats.duration_secs = start.elapsed().as_secs_f64();

        match result {
            Ok(()) => {
                self.transition(MigrationState::Done);
                info!(
                    "Migration complete: {} fetched, {} missing, {} written in {} batches, {:.2}s ({:.0} pts/sec)",
                    self.stats.fetched,
                    self.stats.missing,
                    self.stats.written,
                    self.stats.batches,
                    self.stats.duration_secs,
                    self.stats.throughput()
                );
                Ok(self.stats.clone())
            }
            Err(e) => {
                error!(
                    "Migration failed in state {:?} after {} batches ({} points written): {}",
                    self.state, self.stats.batches, self.stats.written, e
                );
                self.transition(MigrationState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&mut self, ids: &[String]) -> Result<()> {
        let batch_size = self.options.batch_size;
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            return Err(Error::Config(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}"
            )));
        }

        self.stats = MigrationStats {
            requested: ids.len() as u64,
            ..Default::default()
        };

        let source = self.reader.open(&self.source_index).await?;
        let descriptor = CollectionDescriptor {
            name: self.collection.clone(),
            dimension: source.dimension,
            metric: self.metric,
        };
        self.transition(MigrationState::SourceReady);

        let dump = RefCell::new(
            self.options
                .dump_path
                .as_deref()
                .map(RecordDump::create)
                .transpose()?,
        );

        let dry_run = self.options.dry_run;
        if dry_run {
            info!("Dry run mode - not writing to destination");
        } else {
            self.writer.create_collection(&descriptor).await?;
        }
        self.transition(MigrationState::DestinationReady);

        let progress = create_progress_bar(ids.len() as u64, self.options.progress);
        self.transition(MigrationState::Migrating);

        let tally = RefCell::new(std::mem::take(&mut self.stats));
        let reader = self.reader.as_ref();
        let writer = self.writer.as_ref();
        let (descriptor, progress, dump, tally) = (&descriptor, &progress, &dump, &tally);

        let result = try_for_each_batch(ids, batch_size, move |batch| async move {
            let mut fetched = reader.fetch_batch(batch.items).await?;

            let mut records = Vec::with_capacity(fetched.len());
            for (position, id) in batch.items.iter().enumerate() {
                match fetched.remove(id) {
                    Some(record) => records.push((position, record)),
                    None => debug!("Id '{}' not found at source", id),
                }
            }
            let missing = batch.len() - records.len();

            if let Some(dump) = dump.borrow_mut().as_mut() {
                dump.append(records.iter().map(|(_, r)| r))?;
            }

            if !dry_run && !records.is_empty() {
                write_batch(writer, descriptor, &records, batch.offset).await?;
            }

            let mut stats = tally.borrow_mut();
            stats.batches += 1;
            stats.fetched += records.len() as u64;
            stats.missing += missing as u64;
            if !dry_run {
                stats.written += records.len() as u64;
            }
            progress.inc(batch.len() as u64);
            debug!(
                "Batch {} done: {} written, {} missing",
                batch.index,
                records.len(),
                missing
            );
            Ok::<_, Error>(())
        })
        .await;

        self.stats = tally.take();
        let dump_path = dump.take().map(RecordDump::finish).transpose();
        if result.is_err() {
            progress.abandon();
        }
        result?;
        self.stats.dump_path = dump_path?;
        progress.finish_with_message("Migration complete");

        if self.options.verify && !dry_run {
            let count = self.writer.count(&descriptor.name).await?;
            if count != self.stats.written {
                warn!(
                    "Destination holds {} points, {} were written",
                    count, self.stats.written
                );
            }
            self.stats.destination_count = Some(count);
        }

        Ok(())
    }
}

/// Validates `config`, loads its ids and runs the migration.
///
/// # Errors
///
/// Returns configuration errors or the first migration error.
pub async fn migrate(
    config: &MigrationConfig,
    credentials: &dyn CredentialProvider,
) -> Result<MigrationStats> {
    config.validate()?;
    let ids = config.ids.load()?;
    let mut migration = Migration::from_config(config, credentials)?;
    migration.run(&ids).await
}

fn create_progress_bar(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    pb
}
