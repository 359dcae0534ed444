//! Input readers
//!
//! Every reader returns exactly one payload per input row so that results can
//! be matched back to rows by position. Blank rows are kept; the commands turn
//! them into `NotFound` without a request.

use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::fetcher::reverse::{Coordinate, CoordinateError};

/// Input errors. Any of these aborts the run before a request is issued.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// File could not be read
    #[error("failed to read {path}: {message}")]
    Read {
        /// Input path
        path: String,
        /// Underlying error
        message: String,
    },

    /// CSV could not be parsed
    #[error("CSV error in {path}: {message}")]
    Csv {
        /// Input path
        path: String,
        /// Underlying error
        message: String,
    },

    /// None of the mapped address columns exist in the header
    #[error("none of the address columns {expected:?} found in {path}")]
    MissingColumns {
        /// Input path
        path: String,
        /// Column names looked for
        expected: Vec<String>,
    },

    /// A required column is absent from the header
    #[error("column '{column}' not found in {path}")]
    MissingColumn {
        /// Input path
        path: String,
        /// Column name looked for
        column: String,
    },
}

/// Result type for input operations
pub type InputResult<T> = Result<T, InputError>;

/// Read one item per line.
///
/// Leading and trailing blank lines of the file are dropped; blank lines in
/// between keep their position. Each line is trimmed.
pub fn read_lines<P: AsRef<Path>>(path: P) -> InputResult<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| InputError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        info!("Read 0 lines from {}", path.display());
        return Ok(Vec::new());
    }

    let lines: Vec<String> = trimmed.lines().map(|l| l.trim().to_string()).collect();
    info!("Read {} lines from {}", lines.len(), path.display());
    Ok(lines)
}

/// CSV header names that make up an address, joined in this order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Street column
    pub street: String,
    /// City column
    pub city: String,
    /// State column
    pub state: String,
    /// Postal code column
    pub postcode: String,
    /// Country column
    pub country: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            street: "Street".to_string(),
            city: "City".to_string(),
            state: "State".to_string(),
            postcode: "PostalCode".to_string(),
            country: "Country".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Column names in join order
    pub fn columns(&self) -> [&str; 5] {
        [
            self.street.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.postcode.as_str(),
            self.country.as_str(),
        ]
    }
}

/// Read addresses from a CSV with a header row.
///
/// Non-empty mapped fields are joined with ", ". Rows with no address parts
/// yield an empty string and are logged with their 1-based row number.
pub fn read_csv_addresses<P: AsRef<Path>>(
    path: P,
    mapping: &ColumnMapping,
) -> InputResult<Vec<String>> {
    let path = path.as_ref();
    let csv_error = |e: csv::Error| InputError::Csv {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let positions: Vec<Option<usize>> = mapping
        .columns()
        .iter()
        .map(|name| headers.iter().position(|h| h == *name))
        .collect();

    if positions.iter().all(Option::is_none) {
        return Err(InputError::MissingColumns {
            path: path.display().to_string(),
            expected: mapping.columns().iter().map(|c| c.to_string()).collect(),
        });
    }

    let mut addresses = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let address = positions
            .iter()
            .filter_map(|pos| pos.and_then(|i| record.get(i)))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if address.is_empty() {
            warn!("Skipping empty address at row {}", row + 1);
        }
        addresses.push(address);
    }

    info!("Read {} rows from {}", addresses.len(), path.display());
    Ok(addresses)
}

/// Read coordinates from a CSV with a header row.
///
/// Both columns must exist in the header. A row whose values are blank, not
/// numbers or out of range keeps a `None` slot and is logged with its 1-based
/// row number.
pub fn read_csv_coordinates<P: AsRef<Path>>(
    path: P,
    lat_column: &str,
    lon_column: &str,
) -> InputResult<Vec<Option<Coordinate>>> {
    let path = path.as_ref();
    let csv_error = |e: csv::Error| InputError::Csv {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let position = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| InputError::MissingColumn {
                path: path.display().to_string(),
                column: column.to_string(),
            })
    };
    let lat_pos = position(lat_column)?;
    let lon_pos = position(lon_column)?;

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let lat = record.get(lat_pos).unwrap_or_default();
        let lon = record.get(lon_pos).unwrap_or_default();
        match coordinate_from_fields(lat, lon) {
            Ok(point) => points.push(Some(point)),
            Err(e) => {
                warn!("Skipping invalid coordinate at row {}: {}", row + 1, e);
                points.push(None);
            }
        }
    }

    info!("Read {} rows from {}", points.len(), path.display());
    Ok(points)
}

fn coordinate_from_fields(lat: &str, lon: &str) -> Result<Coordinate, CoordinateError> {
    let malformed = || CoordinateError::Malformed(format!("{lat},{lon}"));
    let lat: f64 = lat.parse().map_err(|_| malformed())?;
    let lon: f64 = lon.parse().map_err(|_| malformed())?;
    if !lat.is_finite() || !lon.is_finite() {
        return Err(malformed());
    }
    Coordinate::new(lat, lon)
}
