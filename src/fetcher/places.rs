//! Places search over one grid cell

use serde::Deserialize;
use serde_json::Value;

use super::http::ApiClient;
use super::pagination::{Drained, PageCursor, PageDrain};
use super::FetchOutcome;
use crate::grid::GridCell;
use crate::scheduler::RetryPolicy;

/// Places endpoint
pub const PLACES_ENDPOINT: &str = "/v2/places";

/// GeoJSON feature collection
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Option<Vec<Value>>,
}

/// Fetches places inside a rectangle, one page per call
#[derive(Debug, Clone)]
pub struct PlacesFetcher {
    client: ApiClient,
    categories: String,
}

impl PlacesFetcher {
    /// Create a fetcher for a comma-separated category list
    pub fn new(client: ApiClient, categories: impl Into<String>) -> Self {
        Self {
            client,
            categories: categories.into(),
        }
    }

    /// Categories sent with every page
    pub fn categories(&self) -> &str {
        &self.categories
    }

    /// Query parameters for one page of one cell
    pub fn query(&self, cell: &GridCell, cursor: PageCursor) -> Vec<(&'static str, String)> {
        vec![
            ("categories", self.categories.clone()),
            ("filter", cell.rect_filter()),
            ("limit", cursor.page_size.to_string()),
            ("offset", cursor.offset.to_string()),
        ]
    }

    /// Fetch one page of features.
    ///
    /// A 200 without a `features` list is classified as a `TransportError`
    /// so the drain stops instead of spinning on it.
    pub async fn fetch_page(&self, cell: &GridCell, cursor: PageCursor) -> FetchOutcome<Vec<Value>> {
        let response: FetchOutcome<FeatureCollection> = self
            .client
            .get_json(PLACES_ENDPOINT, &self.query(cell, cursor))
            .await;

        match response {
            FetchOutcome::Success(FeatureCollection {
                features: Some(features),
            }) => FetchOutcome::Success(features),
            FetchOutcome::Success(_) => {
                FetchOutcome::TransportError("response without features".to_string())
            }
            other => other.map(|_| Vec::new()),
        }
    }

    /// Drain every page of one cell, retrying each page under `retry`
    pub async fn drain_cell(
        &self,
        cell: &GridCell,
        drain: &PageDrain,
        retry: &RetryPolicy,
    ) -> Drained<Value> {
        let label = cell.to_string();
        drain
            .drain(&label, |cursor| {
                let label = format!("{label} offset {}", cursor.offset);
                async move {
                    retry
                        .run(&label, |_attempt| self.fetch_page(cell, cursor))
                        .await
                }
            })
            .await
    }
}

/// `properties` object of a GeoJSON feature, or the feature itself if absent
pub fn feature_properties(feature: Value) -> Value {
    match feature {
        Value::Object(mut map) => match map.remove("properties") {
            Some(properties) => properties,
            None => Value::Object(map),
        },
        other => other,
    }
}
