//! Bounded retry with a fixed inter-attempt delay

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};
use super::retry_formatter::RetryContext;
use crate::fetcher::FetchOutcome;
use crate::metrics;

/// Retry policy for a single work item
///
/// Only transient outcomes (`RateLimited`, `ServerError`, `TransportError`)
/// are retried. Once attempts run out, the last observed outcome is returned
/// unchanged so callers can tell "last seen as rate limited" from "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        )
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` counts the first attempt and is at least 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it yields a terminal outcome or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. `label` identifies the work
    /// item in log lines.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> FetchOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = FetchOutcome<T>>,
    {
        let mut attempt = 1;
        loop {
            let outcome = op(attempt).await;

            if !outcome.is_transient() {
                if attempt > 1 {
                    let ctx = RetryContext::new(
                        attempt,
                        self.max_attempts,
                        outcome.kind(),
                        outcome.describe(),
                        Duration::ZERO,
                        label,
                    );
                    info!("{}", ctx.format_success());
                }
                return outcome;
            }

            let ctx = RetryContext::new(
                attempt,
                self.max_attempts,
                outcome.kind(),
                outcome.describe(),
                self.delay,
                label,
            );

            if attempt >= self.max_attempts {
                metrics::record_retry_exhausted(outcome.kind());
                warn!(
                    attempts = self.max_attempts,
                    outcome = outcome.kind().as_str(),
                    "{}",
                    ctx.format_failure()
                );
                return outcome;
            }

            warn!("{}", ctx.format_retry());
            metrics::record_retry(outcome.kind(), self.delay);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            debug!(attempt = attempt + 1, "Retrying {}", label);
            attempt += 1;
        }
    }
}
