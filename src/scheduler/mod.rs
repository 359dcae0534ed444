//! Bulk request orchestration
//!
//! Turns an ordered list of work items into a bounded-concurrency,
//! rate-limited, retrying stream of fetches whose results come back in input
//! order.
//!
//! # Components
//!
//! - [`executor`] - [`BatchScheduler`]: windows per tick, worker-pool cap, ordered results
//! - [`rate_limit`] - [`RateLimiter`]: time-windowed semaphore behind the tick
//! - [`retry`] - [`RetryPolicy`]: bounded attempts with a fixed delay
//! - [`retry_formatter`] - uniform retry and exhaustion log lines
//! - [`config`] - defaults and the overridable [`BatchConfig`]
//!
//! # Quick Start
//!
//! ```no_run
//! use geo_bulk_fetcher::fetcher::FetchOutcome;
//! use geo_bulk_fetcher::scheduler::{BatchConfig, BatchScheduler, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchConfig::default();
//! let scheduler = BatchScheduler::new(&config)?;
//! let retry = RetryPolicy::new(config.max_attempts, config.retry_delay);
//!
//! let addresses = vec!["Berlin".to_string(), "Paris".to_string()];
//! let results = scheduler
//!     .run(addresses, move |item| async move {
//!         retry
//!             .run(&item.payload, |_attempt| async { FetchOutcome::Success(()) })
//!             .await
//!     })
//!     .await?;
//! assert_eq!(results.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod rate_limit;
pub mod retry;
pub mod retry_formatter;

pub use config::BatchConfig;
pub use executor::{into_work_items, BatchScheduler, ResultRecord, WorkItem};
pub use rate_limit::{RateLimitError, RateLimiter};
pub use retry::RetryPolicy;

/// Scheduler errors
///
/// Per-item failures are never reported here; they live in each item's
/// outcome. These errors abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Configuration that cannot make progress
    #[error("invalid scheduler configuration: {0}")]
    InvalidConfig(String),

    /// Rate limiter or worker pool closed
    #[error("rate limiter error: {0}")]
    RateLimiter(String),

    /// A work item task panicked or was cancelled
    #[error("work item task failed: {0}")]
    TaskFailed(String),

    /// A slot was never filled
    #[error("no result recorded for item {0}")]
    MissingResult(usize),
}
