//! Request, retry and scheduling metrics
//!
//! Counters and histograms are emitted through the `metrics` facade and are
//! no-ops until a recorder is installed. [`init_metrics`] installs the
//! Prometheus exporter; the CLI only calls it when `--metrics-addr` is set.

use metrics::{counter, describe_counter, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::fetcher::OutcomeKind;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Install the Prometheus exporter and register metric descriptions
///
/// Idempotent: later calls return `Ok(())` without rebinding.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics exporter on {}", addr);

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        METRICS_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(format!("Failed to install Prometheus exporter: {e}").into());
    }

    describe_counter!(
        "geo_requests_total",
        Unit::Count,
        "HTTP requests issued to the geospatial API, by endpoint and status"
    );
    describe_histogram!(
        "geo_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "geo_retries_total",
        Unit::Count,
        "Retry attempts, by the outcome that triggered them"
    );
    describe_counter!(
        "geo_retry_exhausted_total",
        Unit::Count,
        "Work items that ran out of attempts"
    );
    describe_counter!(
        "geo_windows_dispatched_total",
        Unit::Count,
        "Batch windows released by the scheduler"
    );
    describe_counter!(
        "geo_items_completed_total",
        Unit::Count,
        "Work items resolved, by final outcome"
    );

    Ok(())
}

/// Whether the exporter is installed
pub fn is_initialized() -> bool {
    METRICS_INITIALIZED.load(Ordering::SeqCst)
}

/// Next request correlation id
pub fn next_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{id:08x}")
}

/// Timing and status recording for one HTTP request
pub struct HttpRequestMetrics {
    endpoint: String,
    start_time: Instant,
    correlation_id: String,
}

impl HttpRequestMetrics {
    /// Start recording a request
    pub fn start(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let correlation_id = next_correlation_id();
        debug!(correlation_id = %correlation_id, endpoint = %endpoint, "Starting request");
        Self {
            endpoint,
            start_time: Instant::now(),
            correlation_id,
        }
    }

    /// Record a response status
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "geo_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => status_code.to_string(),
        )
        .increment(1);
        histogram!(
            "geo_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());

        if status_code == 429 {
            warn!(
                correlation_id = %self.correlation_id,
                endpoint = %self.endpoint,
                duration_ms = duration.as_millis(),
                "Rate limit response (429)"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            status = status_code,
            duration_ms = duration.as_millis(),
            "Request completed"
        );
    }

    /// Record a transport failure (no status code)
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();

        counter!(
            "geo_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => "network_error",
        )
        .increment(1);
        histogram!(
            "geo_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());
    }

    /// Correlation id of this request
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Record one retry triggered by `trigger`
pub fn record_retry(trigger: OutcomeKind, delay: Duration) {
    counter!("geo_retries_total", "outcome" => trigger.as_str()).increment(1);
    debug!(
        outcome = trigger.as_str(),
        delay_ms = delay.as_millis(),
        "Retry recorded"
    );
}

/// Record an item that ran out of attempts
pub fn record_retry_exhausted(last: OutcomeKind) {
    counter!("geo_retry_exhausted_total", "outcome" => last.as_str()).increment(1);
}

/// Record a released window
pub fn record_window_dispatched(size: usize) {
    counter!("geo_windows_dispatched_total").increment(1);
    gauge!("geo_last_window_size").set(size as f64);
}

/// Record a resolved work item
pub fn record_item_completed(kind: OutcomeKind) {
    counter!("geo_items_completed_total", "outcome" => kind.as_str()).increment(1);
}

/// Wait-time recording for rate limiter permits
pub struct RateLimiterMetrics {
    start_time: Option<Instant>,
}

impl Default for RateLimiterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterMetrics {
    /// Create a new recorder
    pub fn new() -> Self {
        Self { start_time: None }
    }

    /// Start measuring queue wait time
    pub fn start_acquire(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Record a granted acquisition
    pub fn record_acquired(&mut self, permits: u32) {
        if let Some(start) = self.start_time.take() {
            let wait = start.elapsed();
            histogram!("geo_rate_limit_wait_seconds").record(wait.as_secs_f64());
            if wait.as_millis() > 100 {
                debug!(
                    permits = permits,
                    wait_ms = wait.as_millis(),
                    "Rate limit permits acquired after wait"
                );
            }
        }
    }

    /// Update available permits gauge
    pub fn update_available_permits(&self, available: u32) {
        gauge!("geo_rate_limit_permits_available").set(available as f64);
    }
}
