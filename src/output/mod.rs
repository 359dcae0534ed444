//! Output writers
//!
//! One record per input item, in input order. Successful results are written
//! as returned by the API; anything else becomes a failure record so the
//! output stays line-aligned with the input.

use serde::Serialize;
use serde_json::{json, Value};

use crate::fetcher::FetchOutcome;

pub mod csv;
pub mod ndjson;

pub use self::csv::{CsvReportWriter, StandardizedRow, ValidationRow};
pub use self::ndjson::NdjsonWriter;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Record written in place of a result that never arrived
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    /// Outcome description, e.g. "Not found"
    pub error: String,
    /// HTTP status, when one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl FailureRecord {
    /// Build the record for a non-success outcome
    pub fn from_outcome<T>(outcome: &FetchOutcome<T>) -> Self {
        let status = match outcome {
            // a 404 reads the same as an empty result list
            FetchOutcome::NotFound => None,
            other => other.status(),
        };
        Self {
            error: outcome.describe(),
            status,
        }
    }
}

/// JSON line for one outcome
pub fn outcome_record(outcome: &FetchOutcome<Value>) -> Value {
    match outcome {
        FetchOutcome::Success(value) => value.clone(),
        failed => json!(FailureRecord::from_outcome(failed)),
    }
}
