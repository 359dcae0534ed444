//! Tick-based rate limiting
//!
//! A time-windowed semaphore: at most `permits_per_tick` permits can be taken
//! within any one tick. Every permit is held for a full tick after it was
//! acquired and released in the background, so the issue rate does not depend
//! on how long the guarded requests take to complete.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};

use crate::metrics::RateLimiterMetrics;

/// Rate limiter releasing a fixed number of permits per tick
///
/// Each [`BatchScheduler`](super::BatchScheduler) owns its own limiter, so two
/// schedulers built in the same process never share a clock.
#[derive(Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    permits_per_tick: usize,
    tick: Duration,
}

impl RateLimiter {
    /// Create a limiter releasing `permits_per_tick` permits every `tick`
    pub fn per_tick(permits_per_tick: usize, tick: Duration) -> Self {
        let permits_per_tick = permits_per_tick.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(permits_per_tick)),
            permits_per_tick,
            tick,
        }
    }

    /// Permits released per tick
    pub fn permits_per_tick(&self) -> usize {
        self.permits_per_tick
    }

    /// Tick length
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Permits currently available without waiting
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Acquire `count` permits and return the instant they were granted.
    ///
    /// Requests above the per-tick allowance are clamped to it. The permits
    /// stay taken until one tick after the returned instant.
    pub async fn acquire(&self, count: usize) -> Result<Instant, RateLimitError> {
        let count = count.clamp(1, self.permits_per_tick);
        let mut metrics = RateLimiterMetrics::new();
        metrics.start_acquire();

        let permit = self
            .semaphore
            .clone()
            .acquire_many_owned(count as u32)
            .await
            .map_err(|e| RateLimitError::AcquireError(e.to_string()))?;

        let granted_at = Instant::now();
        metrics.record_acquired(count as u32);
        metrics.update_available_permits(self.semaphore.available_permits() as u32);

        let tick = self.tick;
        tokio::spawn(async move {
            sleep(tick).await;
            drop(permit);
        });

        Ok(granted_at)
    }
}

/// Rate limiter errors
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Failed to acquire permits
    #[error("failed to acquire rate limit permits: {0}")]
    AcquireError(String),
}
