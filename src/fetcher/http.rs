//! Geoapify HTTP client
//!
//! Shared by every fetch unit. Performs one GET, attaches the API key and maps
//! the response onto [`FetchOutcome`]. Retrying is the caller's business (see
//! [`crate::scheduler::RetryPolicy`]).

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::fetcher::{FetchOutcome, FetcherError, FetcherResult};
use crate::metrics::HttpRequestMetrics;

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://api.geoapify.com";

/// Shortest key the provider issues
const MIN_API_KEY_LEN: usize = 10;

/// HTTP client bound to one base URL and API key
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Build a client with explicit timeouts
    ///
    /// # Arguments
    /// * `base_url` - API host, e.g. "<https://api.geoapify.com>"
    /// * `api_key` - Static API key sent as the `apiKey` query parameter
    /// * `connect_timeout` - Time allowed to establish the connection
    /// * `request_timeout` - Time allowed for the whole request
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> FetcherResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().len() < MIN_API_KEY_LEN {
            return Err(FetcherError::InvalidApiKey(format!(
                "expected at least {MIN_API_KEY_LEN} characters"
            )));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(FetcherError::InvalidBaseUrl(base_url));
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| FetcherError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a GET request and deserialize a 200 body
    ///
    /// # Arguments
    /// * `endpoint` - API path, e.g. "/v1/geocode/search"
    /// * `params` - Query parameters (the API key is appended here)
    ///
    /// # Returns
    /// `Success` with the decoded body, or the classified failure. A body that
    /// fails to decode is reported as a `TransportError`.
    pub async fn get_json<T>(&self, endpoint: &str, params: &[(&str, String)]) -> FetchOutcome<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let metrics = HttpRequestMetrics::start(endpoint);

        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("apiKey", self.api_key.clone()));

        debug!("GET {} with {} params", url, params.len());

        let response = match self.client.get(&url).query(&query).send().await {
            Ok(resp) => resp,
            Err(e) => {
                metrics.record_network_error();
                warn!("Request to {} failed: {}", endpoint, e);
                return FetchOutcome::from_transport(&e);
            }
        };

        let status = response.status();
        metrics.record_complete(status.as_u16());

        if status != reqwest::StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            debug!("{} returned {}: {}", endpoint, status, body);
            return FetchOutcome::from_status(status);
        }

        match response.json::<T>().await {
            Ok(data) => FetchOutcome::Success(data),
            Err(e) => {
                warn!("Failed to decode response from {}: {}", endpoint, e);
                FetchOutcome::TransportError(format!("malformed response body: {e}"))
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the key
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
