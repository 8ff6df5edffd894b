//! Optional JSON dump of fetched records.
//!
//! The dump is a single JSON object mapping id to record, written batch by
//! batch so records never accumulate in memory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::connectors::Record;
use crate::error::{Error, Result};

/// Streaming writer for the record dump.
pub struct RecordDump {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl RecordDump {
    /// Creates (truncates) the dump file and writes the opening brace.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| {
            Error::Config(format!("Failed to create dump file '{}': {}", path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        writer.write_all(b"{")?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            written: 0,
        })
    }

    /// Appends records in the given order.
    pub fn append<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) -> Result<()> {
        for record in records {
            if self.written > 0 {
                self.writer.write_all(b",")?;
            }
            serde_json::to_writer(&mut self.writer, &record.id)?;
            self.writer.write_all(b":")?;
            serde_json::to_writer(&mut self.writer, record)?;
            self.written += 1;
        }
        Ok(())
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.written
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Closes the object and flushes; returns the dump path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.write_all(b"}")?;
        self.writer.flush()?;
        Ok(self.path)
    }
}
