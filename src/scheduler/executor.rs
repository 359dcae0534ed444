//! Rate-limited batch scheduler
//!
//! Items are cut into consecutive windows of `window_size`. One window is
//! released per tick: window k+1 never starts before one tick has passed since
//! window k started, however long its requests take. A separate worker-pool
//! semaphore caps the number of operations in flight across windows. Results
//! come back index-aligned with the input regardless of completion order.

use indicatif::ProgressBar;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::config::BatchConfig;
use super::rate_limit::RateLimiter;
use super::SchedulerError;
use crate::metrics;

/// One unit of input: its position in the input sequence plus the payload
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem<P> {
    /// Position in the original input
    pub index: usize,
    /// Data needed to perform one fetch
    pub payload: P,
}

/// Final result for one work item
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord<O> {
    /// Position of the originating work item
    pub index: usize,
    /// Whatever the operation produced for that item
    pub outcome: O,
}

/// Wrap raw payloads into index-tagged work items
pub fn into_work_items<P>(payloads: impl IntoIterator<Item = P>) -> Vec<WorkItem<P>> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| WorkItem { index, payload })
        .collect()
}

/// Scheduler owning its own rate-limit clock and worker-pool capacity
///
/// Build one per run. Nothing is shared between instances.
pub struct BatchScheduler {
    window_size: usize,
    limiter: RateLimiter,
    pool: Arc<Semaphore>,
    pool_cap: usize,
    progress: Option<ProgressBar>,
}

impl BatchScheduler {
    /// Create a scheduler from a validated configuration
    pub fn new(config: &BatchConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            window_size: config.window_size,
            limiter: RateLimiter::per_tick(config.window_size, config.tick),
            pool: Arc::new(Semaphore::new(config.pool_cap)),
            pool_cap: config.pool_cap,
            progress: None,
        })
    }

    /// Advance `progress` once per resolved item
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Items released per tick
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Concurrency ceiling
    pub fn pool_cap(&self) -> usize {
        self.pool_cap
    }

    /// Number of windows needed for `n` items
    pub fn window_count(&self, n: usize) -> usize {
        n.div_ceil(self.window_size)
    }

    /// Run `op` once per payload and collect index-aligned results.
    ///
    /// `op` must classify its own failures; the scheduler never cancels an
    /// operation and waits for all of them before returning. The only error is
    /// a panicking operation, which is treated as a defect and aborts the run.
    pub async fn run<P, O, F, Fut>(
        &self,
        payloads: Vec<P>,
        op: F,
    ) -> Result<Vec<ResultRecord<O>>, SchedulerError>
    where
        P: Send + 'static,
        O: Send + 'static,
        F: Fn(WorkItem<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let total = payloads.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let windows = self.window_count(total);
        info!(
            "Scheduling {} items in {} windows of up to {} (pool cap {})",
            total, windows, self.window_size, self.pool_cap
        );

        let op = Arc::new(op);
        let mut tasks: JoinSet<(usize, O)> = JoinSet::new();
        let mut items = into_work_items(payloads).into_iter().peekable();
        let mut window_index = 0;

        while items.peek().is_some() {
            let window: Vec<WorkItem<P>> = items.by_ref().take(self.window_size).collect();
            window_index += 1;

            // Blocks until one tick has passed since the previous window started
            self.limiter
                .acquire(window.len())
                .await
                .map_err(|e| SchedulerError::RateLimiter(e.to_string()))?;

            metrics::record_window_dispatched(window.len());
            debug!(
                "Dispatching window {}/{} ({} items)",
                window_index,
                windows,
                window.len()
            );

            for item in window {
                // Issue order is preserved: a full pool stalls dispatch, not reordering
                let permit = self
                    .pool
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| SchedulerError::RateLimiter(e.to_string()))?;
                let op = op.clone();
                tasks.spawn(async move {
                    let index = item.index;
                    let outcome = op(item).await;
                    drop(permit);
                    (index, outcome)
                });
            }
        }

        let mut slots: Vec<Option<O>> = std::iter::repeat_with(|| None).take(total).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    slots[index] = Some(outcome);
                    if let Some(progress) = &self.progress {
                        progress.inc(1);
                    }
                }
                Err(e) => {
                    error!("Work item task failed: {}", e);
                    tasks.abort_all();
                    return Err(SchedulerError::TaskFailed(e.to_string()));
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.map(|outcome| ResultRecord { index, outcome })
                    .ok_or(SchedulerError::MissingResult(index))
            })
            .collect()
    }
}
