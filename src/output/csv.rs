//! CSV report writers for the validation and standardization commands

use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter};
use crate::validation::Verdict;

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// One row of the validation report
#[derive(Debug, Serialize)]
pub struct ValidationRow<'a> {
    /// Address as read from the input
    #[serde(rename = "Original Address")]
    pub original_address: &'a str,
    /// CONFIRMED, NOT_CONFIRMED or PARTIALLY_CONFIRMED
    #[serde(rename = "Validation Result")]
    pub result: &'a str,
    /// Reason code, empty for outright verdicts
    #[serde(rename = "Reason")]
    pub reason: &'a str,
}

impl<'a> ValidationRow<'a> {
    /// Report columns
    pub const HEADERS: [&'static str; 3] = ["Original Address", "Validation Result", "Reason"];

    /// Row for one verdict
    pub fn new(original_address: &'a str, verdict: &'a Verdict) -> Self {
        Self {
            original_address,
            result: verdict.status.as_str(),
            reason: &verdict.reason,
        }
    }
}

/// One row of the standardization report
#[derive(Debug, Serialize)]
pub struct StandardizedRow<'a> {
    /// Address as read from the input
    #[serde(rename = "Original Address")]
    pub original_address: &'a str,
    /// Filled template, empty when geocoding failed
    #[serde(rename = "Standardized Address")]
    pub standardized_address: &'a str,
}

impl StandardizedRow<'_> {
    /// Report columns
    pub const HEADERS: [&'static str; 2] = ["Original Address", "Standardized Address"];
}

/// CSV report writer; the header row is written on creation
pub struct CsvReportWriter {
    writer: Writer<BufWriter<File>>,
    rows_written: u64,
}

impl CsvReportWriter {
    /// Create (or truncate) the report file
    ///
    /// # Arguments
    /// * `path` - Output file path; missing parent directories are created
    /// * `headers` - Column names, written even if no row follows
    pub fn new<P: AsRef<Path>>(path: P, headers: &[&str]) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV report writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))?;

        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(buf_writer);
        writer
            .write_record(headers)
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write one row
    pub fn write_row<R: Serialize>(&mut self, row: &R) -> OutputResult<()> {
        self.writer
            .serialize(row)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {e}")))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl OutputWriter for CsvReportWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    fn close(mut self) -> OutputResult<()> {
        debug!("Closing CSV report writer: {} rows written", self.rows_written);
        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;
        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        info!("CSV report closed successfully: {} rows written", self.rows_written);
        Ok(())
    }
}
