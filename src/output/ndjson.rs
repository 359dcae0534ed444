//! Newline-delimited JSON writer

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Writes one JSON document per line
pub struct NdjsonWriter {
    writer: BufWriter<File>,
    records_written: u64,
}

impl NdjsonWriter {
    /// Create (or truncate) the output file
    ///
    /// # Arguments
    /// * `path` - Output file path; missing parent directories are created
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating NDJSON writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))?;

        Ok(Self {
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file),
            records_written: 0,
        })
    }

    /// Write one record as a single line
    pub fn write_record<T: Serialize>(&mut self, record: &T) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(|e| {
            OutputError::SerializationError(format!("Failed to write record: {e}"))
        })?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| OutputError::IoError(format!("Failed to write newline: {e}")))?;

        self.records_written += 1;
        if self.records_written % 1000 == 0 {
            self.flush()?;
            debug!("Progress: {} records written", self.records_written);
        }
        Ok(())
    }

    /// Write many records
    pub fn write_all<'a, T, I>(&mut self, records: I) -> OutputResult<()>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl OutputWriter for NdjsonWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let file = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;
        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        info!(
            "NDJSON writer closed successfully: {} records written",
            self.records_written
        );
        Ok(())
    }
}
