//! Reverse geocoding: coordinates to the nearest address-like result

use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use super::http::ApiClient;
use super::{FetchOutcome, FetchUnit};

/// Reverse geocoding endpoint
pub const REVERSE_ENDPOINT: &str = "/v1/geocode/reverse";

/// Axis order of a coordinate line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CoordinateOrder {
    /// `lat,lon`
    #[default]
    Latlon,
    /// `lon,lat`
    Lonlat,
}

/// Granularity of the requested result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ResultType {
    /// Building address
    #[default]
    Address,
    /// Street
    Street,
    /// City or town
    City,
    /// Postal code area
    Postcode,
    /// County or district
    County,
    /// State or region
    State,
}

impl ResultType {
    /// Query value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Street => "street",
            Self::City => "city",
            Self::Postcode => "postcode",
            Self::County => "county",
            Self::State => "state",
        }
    }
}

/// Response shape requested from the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ResponseFormat {
    /// `{"results": [...]}`
    #[default]
    Json,
    /// GeoJSON `{"features": [...]}`
    Geojson,
}

impl ResponseFormat {
    /// Query value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Geojson => "geojson",
        }
    }
}

/// A validated WGS84 point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

/// Why a coordinate line was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    /// Not two finite numbers
    #[error("expected two comma-separated numbers, got '{0}'")]
    Malformed(String),

    /// Latitude outside [-90, 90]
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180]
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Build a coordinate, checking ranges
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Parse a `a,b` line in the given axis order
    pub fn parse(line: &str, order: CoordinateOrder) -> Result<Self, CoordinateError> {
        let malformed = || CoordinateError::Malformed(line.trim().to_string());

        let mut parts = line.split(',').map(str::trim);
        let first = parts.next().ok_or_else(malformed)?;
        let second = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        let first: f64 = first.parse().map_err(|_| malformed())?;
        let second: f64 = second.parse().map_err(|_| malformed())?;
        if !first.is_finite() || !second.is_finite() {
            return Err(malformed());
        }

        match order {
            CoordinateOrder::Latlon => Self::new(first, second),
            CoordinateOrder::Lonlat => Self::new(second, first),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Either response shape; whichever list is present is used
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    results: Option<Vec<Value>>,
    features: Option<Vec<Value>>,
}

/// Fetch unit resolving one coordinate
#[derive(Debug, Clone)]
pub struct ReverseGeocodeFetcher {
    client: ApiClient,
    result_type: Option<ResultType>,
    country_code: Option<String>,
    format: ResponseFormat,
}

impl ReverseGeocodeFetcher {
    /// Create a fetcher requesting `format=json` without filters
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            result_type: None,
            country_code: None,
            format: ResponseFormat::Json,
        }
    }

    /// Set the result granularity
    pub fn with_result_type(mut self, result_type: Option<ResultType>) -> Self {
        self.result_type = result_type;
        self
    }

    /// Restrict results to one country
    pub fn with_country_code(mut self, country_code: Option<String>) -> Self {
        self.country_code = country_code
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        self
    }

    /// Select the response shape
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    /// Query parameters for one point
    pub fn query(&self, point: &Coordinate) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("lat", point.lat.to_string()),
            ("lon", point.lon.to_string()),
            ("format", self.format.as_str().to_string()),
        ];
        if let Some(code) = &self.country_code {
            params.push(("filter", format!("countrycode:{code}")));
        }
        if let Some(result_type) = self.result_type {
            params.push(("result_type", result_type.as_str().to_string()));
        }
        params
    }

    /// Reverse geocode one point, returning its first result or feature
    pub async fn reverse(&self, point: &Coordinate) -> FetchOutcome<Value> {
        let response: FetchOutcome<ReverseResponse> =
            self.client.get_json(REVERSE_ENDPOINT, &self.query(point)).await;

        match response {
            FetchOutcome::Success(body) => {
                let first = body
                    .results
                    .or(body.features)
                    .and_then(|list| list.into_iter().next());
                match first {
                    Some(value) => FetchOutcome::Success(value),
                    None => {
                        debug!("No reverse geocoding result for {}", point);
                        FetchOutcome::NotFound
                    }
                }
            }
            other => other.map(|_| Value::Null),
        }
    }
}

/// Unparseable lines are carried as `None` and resolve to `NotFound`
#[async_trait]
impl FetchUnit<Option<Coordinate>> for ReverseGeocodeFetcher {
    type Output = Value;

    async fn fetch(&self, payload: &Option<Coordinate>) -> FetchOutcome<Value> {
        match payload {
            Some(point) => self.reverse(point).await,
            None => FetchOutcome::NotFound,
        }
    }

    fn describe(&self, payload: &Option<Coordinate>) -> String {
        match payload {
            Some(point) => point.to_string(),
            None => "invalid coordinate".to_string(),
        }
    }
}
