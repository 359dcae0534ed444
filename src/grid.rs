//! Spatial grid partitioning
//!
//! Splits a bounding box into equal sub-cells no larger than a requested size
//! so that each cell's place count stays within what pagination can drain.
//! Distances use the flat approximation `1° latitude ≈ 111 km` and
//! `1° longitude ≈ 111 km × cos(mean latitude)`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::scheduler::config::MAX_CELL_SIZE_KM;

/// Kilometres per degree of latitude
pub const KM_PER_DEGREE: f64 = 111.0;

/// Decimal places kept on every cell edge
pub const CELL_PRECISION: i32 = 6;

/// Most cells a single partition may produce
pub const MAX_GRID_CELLS: usize = 1_000_000;

/// Floating noise tolerated before a fractional cell count rounds up
const CELL_COUNT_TOLERANCE: f64 = 1e-4;

/// Grid configuration errors. All of them abort a run before any request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Requested cell size above the hard cap
    #[error("grid cell size {requested} km exceeds the maximum of {max} km")]
    CellTooLarge {
        /// Requested size
        requested: f64,
        /// Hard cap
        max: f64,
    },

    /// Zero, negative or non-finite cell size
    #[error("grid cell size must be a positive number of km, got {0}")]
    InvalidCellSize(f64),

    /// Box too large, or too close to a pole, for the requested cell size
    #[error("grid of {count} cells exceeds the maximum of {max} cells")]
    TooManyCells {
        /// Cells the box would need (saturated at `usize::MAX`)
        count: usize,
        /// Hard cap
        max: usize,
    },

    /// Inverted, empty or out-of-range box
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}

/// Axis-aligned WGS84 rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// West edge
    pub min_lon: f64,
    /// South edge
    pub min_lat: f64,
    /// East edge
    pub max_lon: f64,
    /// North edge
    pub max_lat: f64,
}

impl BoundingBox {
    /// Build a box, rejecting inverted or out-of-range edges
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, GridError> {
        let edges = [min_lon, min_lat, max_lon, max_lat];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(GridError::InvalidBoundingBox(
                "edges must be finite numbers".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&min_lon) || !(-180.0..=180.0).contains(&max_lon) {
            return Err(GridError::InvalidBoundingBox(
                "longitude outside [-180, 180]".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&min_lat) || !(-90.0..=90.0).contains(&max_lat) {
            return Err(GridError::InvalidBoundingBox(
                "latitude outside [-90, 90]".to_string(),
            ));
        }
        if min_lon >= max_lon || min_lat >= max_lat {
            return Err(GridError::InvalidBoundingBox(format!(
                "min must be below max, got {min_lon},{min_lat},{max_lon},{max_lat}"
            )));
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Width in degrees
    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Mean latitude in degrees
    pub fn mean_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }
}

/// Parses `min_lon,min_lat,max_lon,max_lat`
impl FromStr for BoundingBox {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| GridError::InvalidBoundingBox(format!("'{s}': {e}")))?;

        match values.as_slice() {
            [min_lon, min_lat, max_lon, max_lat] => {
                Self::new(*min_lon, *min_lat, *max_lon, *max_lat)
            }
            _ => Err(GridError::InvalidBoundingBox(format!(
                "expected min_lon,min_lat,max_lon,max_lat, got '{s}'"
            ))),
        }
    }
}

/// One sub-rectangle of a partitioned box, edges rounded to 6 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCell {
    /// West edge
    pub min_lon: f64,
    /// South edge
    pub min_lat: f64,
    /// East edge
    pub max_lon: f64,
    /// North edge
    pub max_lat: f64,
}

impl GridCell {
    fn rounded(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon: round_to_precision(min_lon),
            min_lat: round_to_precision(min_lat),
            max_lon: round_to_precision(max_lon),
            max_lat: round_to_precision(max_lat),
        }
    }

    /// Value for the places `filter` parameter
    pub fn rect_filter(&self) -> String {
        format!("rect:{self}")
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

fn round_to_precision(value: f64) -> f64 {
    let scale = 10f64.powi(CELL_PRECISION);
    let rounded = (value * scale).round() / scale;
    // avoid "-0" in filters
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn cells_along(span_deg: f64, cell_deg: f64) -> usize {
    let ratio = span_deg / cell_deg;
    ((ratio - CELL_COUNT_TOLERANCE).ceil() as usize).max(1)
}

/// Cells needed along (longitude, latitude) so no cell exceeds `cell_km`.
///
/// A fractional count within 1e-4 of an integer is rounded down rather than
/// up, so a cell may come out up to 0.01% larger than `cell_km`. This keeps
/// exact fits (a 1° box at 111 km is one cell) from gaining an extra row to
/// floating point noise.
///
/// Fails with [`GridError::TooManyCells`] when the grid would exceed
/// [`MAX_GRID_CELLS`], which happens for large boxes and for boxes touching a
/// pole. The cell size itself is not capped here; [`partition`] does that.
pub fn cell_counts(bbox: &BoundingBox, cell_km: f64) -> Result<(usize, usize), GridError> {
    if !cell_km.is_finite() || cell_km <= 0.0 {
        return Err(GridError::InvalidCellSize(cell_km));
    }
    let lat_cell_deg = cell_km / KM_PER_DEGREE;
    let lon_cell_deg = lat_cell_deg * bbox.mean_lat().to_radians().cos();
    if lon_cell_deg <= 0.0 {
        return Err(GridError::InvalidBoundingBox(
            "box centred on a pole".to_string(),
        ));
    }

    let num_lon = cells_along(bbox.lon_span(), lon_cell_deg);
    let num_lat = cells_along(bbox.lat_span(), lat_cell_deg);
    let count = num_lon.checked_mul(num_lat).unwrap_or(usize::MAX);
    if count > MAX_GRID_CELLS {
        return Err(GridError::TooManyCells {
            count,
            max: MAX_GRID_CELLS,
        });
    }
    Ok((num_lon, num_lat))
}

/// Split `bbox` evenly into `num_lon × num_lat` cells.
///
/// Counts are taken as given; use [`cell_counts`] to get bounded ones.
/// Row-major: the outer loop walks longitude, the inner loop latitude.
pub fn split_even(bbox: &BoundingBox, num_lon: usize, num_lat: usize) -> Vec<GridCell> {
    let num_lon = num_lon.max(1);
    let num_lat = num_lat.max(1);
    let lon_step = bbox.lon_span() / num_lon as f64;
    let lat_step = bbox.lat_span() / num_lat as f64;

    let mut cells = Vec::with_capacity(num_lon * num_lat);
    for i in 0..num_lon {
        let cell_min_lon = bbox.min_lon + i as f64 * lon_step;
        for j in 0..num_lat {
            let cell_min_lat = bbox.min_lat + j as f64 * lat_step;
            cells.push(GridCell::rounded(
                cell_min_lon,
                cell_min_lat,
                cell_min_lon + lon_step,
                cell_min_lat + lat_step,
            ));
        }
    }
    cells
}

/// Partition `bbox` into cells no larger than `cell_km` (at most 5 km)
pub fn partition(bbox: &BoundingBox, cell_km: f64) -> Result<Vec<GridCell>, GridError> {
    if cell_km > MAX_CELL_SIZE_KM {
        return Err(GridError::CellTooLarge {
            requested: cell_km,
            max: MAX_CELL_SIZE_KM,
        });
    }
    let (num_lon, num_lat) = cell_counts(bbox, cell_km)?;
    Ok(split_even(bbox, num_lon, num_lat))
}
