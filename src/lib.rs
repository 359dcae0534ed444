//! # Geo Bulk Fetcher Library
//!
//! Bulk, rate-limited requests against a geospatial HTTP API (Geoapify):
//! forward and reverse geocoding, address validation and standardization,
//! and places search over a gridded bounding box.
//!
//! ## Features
//!
//! - **Windowed Rate Limiting**: at most W requests released per tick, independent of latency
//! - **Bounded Concurrency**: a worker-pool cap on requests in flight
//! - **Ordered Results**: `results[i]` always belongs to `input[i]`
//! - **Retries**: only transient outcomes are retried; the last outcome is kept
//! - **Grid Partitioning**: bounding boxes split into cells no larger than 5 km
//! - **Pagination**: offset-based drain per cell that always terminates
//!
//! ## Quick Start
//!
//! ```no_run
//! use geo_bulk_fetcher::fetcher::{ApiClient, FetchUnit, GeocodeFetcher};
//! use geo_bulk_fetcher::scheduler::{BatchConfig, BatchScheduler, RetryPolicy};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchConfig::default();
//! let client = ApiClient::new(
//!     "https://api.geoapify.com",
//!     "YOUR_API_KEY",
//!     config.connect_timeout,
//!     config.request_timeout,
//! )?;
//! let fetcher = Arc::new(GeocodeFetcher::new(client));
//! let retry = RetryPolicy::new(config.max_attempts, config.retry_delay);
//!
//! let scheduler = BatchScheduler::new(&config)?;
//! let addresses = vec!["Brandenburger Tor, Berlin".to_string()];
//! let results = scheduler
//!     .run(addresses, move |item| {
//!         let fetcher = fetcher.clone();
//!         async move {
//!             retry
//!                 .run(&item.payload, |_| fetcher.fetch(&item.payload))
//!                 .await
//!         }
//!     })
//!     .await?;
//! println!("{:?}", results[0].outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`scheduler`] - Windowed batch scheduler, rate limiter and retry policy
//! - [`fetcher`] - Fetch units, outcome classification and pagination
//! - [`grid`] - Bounding box partitioning
//! - [`validation`] - Confidence-based address verdicts
//! - [`standardize`] - Address templates
//! - [`input`] - Line and CSV readers
//! - [`output`] - NDJSON and CSV writers
//! - [`metrics`] - Request and retry metrics

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Fetch units
pub mod fetcher;

/// Spatial grid partitioning
pub mod grid;

/// Input readers
pub mod input;

/// Metrics facade and Prometheus exporter
pub mod metrics;

/// Output writers
pub mod output;

/// Batch scheduling, rate limiting and retries
pub mod scheduler;

/// Address standardization
pub mod standardize;

/// Address validation
pub mod validation;

// Re-export commonly used types
pub use fetcher::{FetchOutcome, OutcomeKind};
pub use grid::{BoundingBox, GridCell};
pub use scheduler::{BatchConfig, BatchScheduler, RetryPolicy};
