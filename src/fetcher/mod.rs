//! Fetch units and outcome classification
//!
//! A fetch unit performs exactly one network call for one work item and never
//! lets a fault escape: every call resolves to a [`FetchOutcome`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

pub mod geocode;
pub mod http;
pub mod pagination;
pub mod places;
pub mod reverse;

pub use geocode::GeocodeFetcher;
pub use http::ApiClient;
pub use places::PlacesFetcher;
pub use reverse::ReverseGeocodeFetcher;

/// Fetcher setup errors
///
/// These only occur while building clients, never while fetching.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    ClientBuild(String),

    /// Missing or malformed API key
    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    /// Base URL could not be used
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Result type for fetcher setup
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Classified result of one fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// HTTP 200 with a usable payload
    Success(T),
    /// Valid negative result: the provider found nothing
    NotFound,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError(u16),
    /// Request rejected for good (4xx other than 404/429)
    ClientError(u16),
    /// Connection, timeout or body decoding failure
    TransportError(String),
}

/// Coarse outcome label used for logs, metrics and summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Success
    Success,
    /// Not found
    NotFound,
    /// Rate limited
    RateLimited,
    /// Server error
    ServerError,
    /// Client error
    ClientError,
    /// Transport error
    TransportError,
}

impl OutcomeKind {
    /// Stable label for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::TransportError => "transport_error",
        }
    }
}

impl<T> FetchOutcome<T> {
    /// Classify a non-200 HTTP status.
    ///
    /// 200 is never passed here: a successful status still needs its body
    /// decoded before it can become [`FetchOutcome::Success`].
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            404 => Self::NotFound,
            429 => Self::RateLimited,
            code if status.is_server_error() => Self::ServerError(code),
            code if status.is_client_error() => Self::ClientError(code),
            // 1xx/3xx/other 2xx are unexpected for a JSON GET
            code => Self::TransportError(format!("unexpected status {code}")),
        }
    }

    /// Classify a transport-level reqwest error
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let prefix = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connection failed"
        } else if err.is_decode() {
            "malformed response body"
        } else {
            "request failed"
        };
        Self::TransportError(format!("{prefix}: {err}"))
    }

    /// Whether another attempt may produce a different result
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError(_) | Self::TransportError(_)
        )
    }

    /// Whether this is a [`FetchOutcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Outcome label without the payload
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(_) => OutcomeKind::Success,
            Self::NotFound => OutcomeKind::NotFound,
            Self::RateLimited => OutcomeKind::RateLimited,
            Self::ServerError(_) => OutcomeKind::ServerError,
            Self::ClientError(_) => OutcomeKind::ClientError,
            Self::TransportError(_) => OutcomeKind::TransportError,
        }
    }

    /// HTTP status carried by the outcome, if one is known
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success(_) => Some(200),
            Self::NotFound => Some(404),
            Self::RateLimited => Some(429),
            Self::ServerError(code) | Self::ClientError(code) => Some(*code),
            Self::TransportError(_) => None,
        }
    }

    /// Human readable description of a failure
    pub fn describe(&self) -> String {
        match self {
            Self::Success(_) => "success".to_string(),
            Self::NotFound => "Not found".to_string(),
            Self::RateLimited => "rate limit exceeded".to_string(),
            Self::ServerError(code) => format!("server error {code}"),
            Self::ClientError(code) => format!("request rejected with status {code}"),
            Self::TransportError(message) => message.clone(),
        }
    }

    /// Map the success payload
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            Self::Success(value) => FetchOutcome::Success(f(value)),
            Self::NotFound => FetchOutcome::NotFound,
            Self::RateLimited => FetchOutcome::RateLimited,
            Self::ServerError(code) => FetchOutcome::ServerError(code),
            Self::ClientError(code) => FetchOutcome::ClientError(code),
            Self::TransportError(message) => FetchOutcome::TransportError(message),
        }
    }

    /// Borrow the success payload
    pub fn as_success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Drop the payload, keeping only the classification
    pub fn discard(self) -> FetchOutcome<()> {
        self.map(|_| ())
    }
}

/// One network call for one work item payload
#[async_trait]
pub trait FetchUnit<P: Sync>: Send + Sync {
    /// Success payload
    type Output: Send;

    /// Perform the call. Must not panic and must classify every fault.
    async fn fetch(&self, payload: &P) -> FetchOutcome<Self::Output>;

    /// Short label identifying the payload in logs
    fn describe(&self, payload: &P) -> String;
}
