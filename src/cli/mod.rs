//! CLI command implementations
//!
//! Every subcommand follows the same shape: read the whole input, reject bad
//! configuration before any request, run the batch scheduler, write one
//! output record per input item and log a run summary.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::fetcher::http::DEFAULT_BASE_URL;
use crate::fetcher::{ApiClient, FetchOutcome, FetchUnit};
use crate::input::{self, ColumnMapping};
use crate::metrics;
use crate::scheduler::config::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_POOL_CAP, DEFAULT_RETRY_DELAY_MS, DEFAULT_TICK_MS,
    DEFAULT_WINDOW_SIZE, HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS,
};
use crate::scheduler::{BatchConfig, BatchScheduler, RetryPolicy};

pub mod error;
pub mod geocode;
pub mod places;
pub mod reverse;
pub mod standardize;
pub mod validate;

pub use error::CliError;
pub use geocode::GeocodeArgs;
pub use places::PlacesArgs;
pub use reverse::ReverseArgs;
pub use standardize::StandardizeArgs;
pub use validate::ValidateArgs;

/// Bulk geocoding, reverse geocoding and places search against the Geoapify API
#[derive(Parser, Debug)]
#[command(name = "geo-bulk-fetcher")]
#[command(about = "Rate-limited bulk requests against a geospatial HTTP API", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// API key (or set GEOAPIFY_API_KEY)
    #[arg(long, global = true, env = "GEOAPIFY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API host
    #[arg(long, global = true, env = "GEOAPIFY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Requests released per tick
    #[arg(long, global = true, default_value_t = DEFAULT_WINDOW_SIZE, value_parser = parse_positive)]
    pub window_size: usize,

    /// Maximum requests in flight
    #[arg(long, global = true, default_value_t = DEFAULT_POOL_CAP, value_parser = parse_positive)]
    pub pool_cap: usize,

    /// Tick length in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,

    /// Attempts per request, including the first (range: 1-20)
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,

    /// Connection timeout in seconds
    #[arg(long, global = true, default_value_t = HTTP_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds
    #[arg(long, global = true, default_value_t = HTTP_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Geocode addresses to NDJSON
    Geocode(GeocodeArgs),

    /// Reverse geocode coordinates to NDJSON
    Reverse(ReverseArgs),

    /// Geocode addresses and classify how well each one matched
    Validate(ValidateArgs),

    /// Geocode addresses and rewrite them through a template
    Standardize(StandardizeArgs),

    /// Collect places in a bounding box, split into grid cells
    Places(PlacesArgs),
}

impl Cli {
    /// Run the selected command
    pub async fn execute(&self) -> Result<(), CliError> {
        if let Some(addr) = self.metrics_addr {
            metrics::init_metrics(addr)
                .map_err(|e| CliError::ConfigurationError(e.to_string()))?;
        }

        match &self.command {
            Commands::Geocode(args) => args.execute(self).await,
            Commands::Reverse(args) => args.execute(self).await,
            Commands::Validate(args) => args.execute(self).await,
            Commands::Standardize(args) => args.execute(self).await,
            Commands::Places(args) => args.execute(self).await,
        }
    }

    /// Scheduler and page settings from the global flags
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::default()
            .with_window_size(self.window_size)
            .with_pool_cap(self.pool_cap)
            .with_tick(Duration::from_millis(self.tick_ms))
            .with_max_attempts(self.max_attempts)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
            .with_timeouts(
                Duration::from_secs(self.connect_timeout_secs),
                Duration::from_secs(self.request_timeout_secs),
            )
    }

    /// Retry policy from the global flags
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// HTTP client from the global flags
    pub fn api_client(&self) -> Result<ApiClient, CliError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CliError::ConfigurationError(
                "API key missing: pass --api-key or set GEOAPIFY_API_KEY".to_string(),
            )
        })?;
        let config = self.batch_config();
        Ok(ApiClient::new(
            &self.base_url,
            api_key,
            config.connect_timeout,
            config.request_timeout,
        )?)
    }
}

/// Address input shared by the geocoding commands
#[derive(Args, Debug, Clone)]
pub struct AddressInput {
    /// Input file: one address per line, or a CSV with --csv
    #[arg(long)]
    pub input: PathBuf,

    /// Read the input as CSV and build addresses from the mapped columns
    #[arg(long, default_value_t = false)]
    pub csv: bool,

    /// CSV column holding the street
    #[arg(long, default_value = "Street")]
    pub street_column: String,

    /// CSV column holding the city
    #[arg(long, default_value = "City")]
    pub city_column: String,

    /// CSV column holding the state
    #[arg(long, default_value = "State")]
    pub state_column: String,

    /// CSV column holding the postal code
    #[arg(long, default_value = "PostalCode")]
    pub postcode_column: String,

    /// CSV column holding the country
    #[arg(long, default_value = "Country")]
    pub country_column: String,

    /// Restrict results to one country (ISO 3166-1 alpha-2)
    #[arg(long)]
    pub country_code: Option<String>,
}

impl AddressInput {
    /// Column mapping for CSV input
    pub fn mapping(&self) -> ColumnMapping {
        ColumnMapping {
            street: self.street_column.clone(),
            city: self.city_column.clone(),
            state: self.state_column.clone(),
            postcode: self.postcode_column.clone(),
            country: self.country_column.clone(),
        }
    }

    /// Read every address, one per input row
    pub fn read(&self) -> Result<Vec<String>, CliError> {
        let addresses = if self.csv {
            input::read_csv_addresses(&self.input, &self.mapping())?
        } else {
            let lines = input::read_lines(&self.input)?;
            for (row, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    warn!("Skipping empty address at row {}", row + 1);
                }
            }
            lines
        };
        Ok(addresses)
    }
}

/// Counts logged at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items processed
    pub total: usize,
    /// Items with a result
    pub succeeded: usize,
    /// Items the provider found nothing for
    pub not_found: usize,
    /// Items that never got a definitive answer
    pub failed: usize,
}

/// Count outcomes and log the summary. Failed items are listed individually.
pub fn report_summary<T>(command: &str, outcomes: &[FetchOutcome<T>]) -> RunSummary {
    let mut summary = RunSummary {
        total: outcomes.len(),
        ..RunSummary::default()
    };

    for (index, outcome) in outcomes.iter().enumerate() {
        match outcome {
            FetchOutcome::Success(_) => summary.succeeded += 1,
            FetchOutcome::NotFound => summary.not_found += 1,
            failed => {
                summary.failed += 1;
                warn!(
                    index = index,
                    row = index + 1,
                    outcome = failed.kind().as_str(),
                    "Item failed: {}",
                    failed.describe()
                );
            }
        }
    }

    info!(
        "{} finished: {} items, {} successful, {} not found, {} failed",
        command, summary.total, summary.succeeded, summary.not_found, summary.failed
    );
    summary
}

/// Progress bar advanced once per resolved item
pub fn create_progress_bar(total: usize, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Run one fetch unit over every payload: windows per tick, pool cap,
/// per-item retry. Outcomes come back in payload order.
pub async fn run_fetch_unit<U, P>(
    cli: &Cli,
    unit: U,
    payloads: Vec<P>,
    message: &str,
) -> Result<Vec<FetchOutcome<U::Output>>, CliError>
where
    U: FetchUnit<P> + 'static,
    U::Output: 'static,
    P: Send + Sync + 'static,
{
    let progress = create_progress_bar(payloads.len(), message);
    let scheduler = BatchScheduler::new(&cli.batch_config())?.with_progress(progress.clone());
    let retry = cli.retry_policy();
    let unit = Arc::new(unit);

    let results = scheduler
        .run(payloads, move |item| {
            let unit = unit.clone();
            async move {
                let label = unit.describe(&item.payload);
                let outcome = retry
                    .run(&label, |_attempt| unit.fetch(&item.payload))
                    .await;
                metrics::record_item_completed(outcome.kind());
                outcome
            }
        })
        .await?;

    progress.finish_and_clear();
    Ok(results.into_iter().map(|record| record.outcome).collect())
}

fn parse_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}
