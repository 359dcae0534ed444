//! Forward geocoding: free-form address to the best matching location

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::ApiClient;
use super::{FetchOutcome, FetchUnit};

/// Forward geocoding endpoint
pub const GEOCODE_ENDPOINT: &str = "/v1/geocode/search";

/// `format=json` response body
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// Fetch unit resolving one address to its first result
#[derive(Debug, Clone)]
pub struct GeocodeFetcher {
    client: ApiClient,
    country_code: Option<String>,
}

impl GeocodeFetcher {
    /// Create a fetcher
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            country_code: None,
        }
    }

    /// Restrict results to one country (ISO 3166-1 alpha-2, case-insensitive)
    pub fn with_country_code(mut self, country_code: Option<String>) -> Self {
        self.country_code = country_code
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        self
    }

    /// Query parameters for one address
    pub fn query(&self, address: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("text", address.to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
        ];
        if let Some(code) = &self.country_code {
            params.push(("filter", format!("countrycode:{code}")));
        }
        params
    }

    /// Geocode one address. A blank address is `NotFound` without a request.
    pub async fn geocode(&self, address: &str) -> FetchOutcome<Value> {
        let address = address.trim();
        if address.is_empty() {
            return FetchOutcome::NotFound;
        }

        let response: FetchOutcome<SearchResponse> =
            self.client.get_json(GEOCODE_ENDPOINT, &self.query(address)).await;

        match response {
            FetchOutcome::Success(body) => match body.results.into_iter().next() {
                Some(first) => FetchOutcome::Success(first),
                None => {
                    debug!("No geocoding result for '{}'", address);
                    FetchOutcome::NotFound
                }
            },
            other => other.map(|_| Value::Null),
        }
    }
}

#[async_trait]
impl FetchUnit<String> for GeocodeFetcher {
    type Output = Value;

    async fn fetch(&self, payload: &String) -> FetchOutcome<Value> {
        self.geocode(payload).await
    }

    fn describe(&self, payload: &String) -> String {
        payload.clone()
    }
}
