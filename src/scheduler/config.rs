//! Batch configuration defaults and the overridable [`BatchConfig`]

use std::time::Duration;

use super::SchedulerError;

/// Number of work items released per rate-limit tick.
/// Matches the provider's free-tier allowance of 5 requests per second.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Maximum number of fetch operations in flight across all windows.
pub const DEFAULT_POOL_CAP: usize = 10;

/// Length of one rate-limit tick in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Attempts per work item, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between two attempts of the same item in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Maximum result count returned by one places request.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Largest grid cell edge accepted by the grid partitioner, in kilometers.
/// Denser cells risk exceeding what pagination can drain in reasonable time.
pub const MAX_CELL_SIZE_KM: f64 = 5.0;

/// Default grid cell edge in kilometers.
pub const DEFAULT_CELL_SIZE_KM: f64 = 5.0;

/// Overall confidence at or above which an address counts as confirmed.
pub const DEFAULT_MIN_CONFIRMED: f64 = 0.9;

/// Overall confidence at or below which an address counts as not confirmed.
pub const DEFAULT_MAX_NOT_CONFIRMED: f64 = 0.5;

/// HTTP connect timeout (seconds)
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP request timeout (seconds)
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tunables for one bulk run.
///
/// Every knob is independently overridable through the `with_*` builders;
/// [`BatchConfig::validate`] rejects values that would stall or disable the
/// scheduler before any request is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Items released per tick
    pub window_size: usize,
    /// Concurrency ceiling across windows
    pub pool_cap: usize,
    /// Tick length
    pub tick: Duration,
    /// Attempts per item, first one included
    pub max_attempts: u32,
    /// Delay between attempts
    pub retry_delay: Duration,
    /// Page cap for paginated queries
    pub page_size: usize,
    /// HTTP connect timeout
    pub connect_timeout: Duration,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            pool_cap: DEFAULT_POOL_CAP,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout: Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl BatchConfig {
    /// Set the number of items released per tick
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the concurrency ceiling
    pub fn with_pool_cap(mut self, pool_cap: usize) -> Self {
        self.pool_cap = pool_cap;
        self
    }

    /// Set the tick length
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set the attempts per item
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay between attempts
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Set the page cap
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set both HTTP timeouts
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Reject configurations that cannot make progress.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.window_size == 0 {
            return Err(SchedulerError::InvalidConfig(
                "window size must be at least 1".to_string(),
            ));
        }
        if self.pool_cap == 0 {
            return Err(SchedulerError::InvalidConfig(
                "worker pool cap must be at least 1".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(SchedulerError::InvalidConfig(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
