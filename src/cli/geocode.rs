//! `geocode` command

use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{report_summary, run_fetch_unit, AddressInput, Cli, CliError};
use crate::fetcher::{FetchOutcome, GeocodeFetcher};
use crate::output::{outcome_record, NdjsonWriter, OutputWriter};

/// Arguments for the geocode command
#[derive(Parser, Debug)]
pub struct GeocodeArgs {
    /// Address input
    #[command(flatten)]
    pub input: AddressInput,

    /// NDJSON output, one line per input address
    #[arg(long)]
    pub output: PathBuf,
}

impl GeocodeArgs {
    /// Geocode every address and write the results
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let addresses = self.input.read()?;
        let outcomes = geocode_addresses(cli, &self.input, addresses).await?;

        write_ndjson(&self.output, &outcomes)?;
        report_summary("geocode", &outcomes);
        Ok(())
    }
}

/// Geocode addresses in input order. Blank addresses resolve to `NotFound`.
pub async fn geocode_addresses(
    cli: &Cli,
    input: &AddressInput,
    addresses: Vec<String>,
) -> Result<Vec<FetchOutcome<Value>>, CliError> {
    let fetcher = GeocodeFetcher::new(cli.api_client()?)
        .with_country_code(input.country_code.clone());
    info!("Geocoding {} addresses", addresses.len());
    run_fetch_unit(cli, fetcher, addresses, "geocoding").await
}

/// Write one NDJSON line per outcome
pub fn write_ndjson(path: &Path, outcomes: &[FetchOutcome<Value>]) -> Result<(), CliError> {
    let mut writer = NdjsonWriter::new(path)?;
    for outcome in outcomes {
        writer.write_record(&outcome_record(outcome))?;
    }
    writer.close()?;
    info!("Wrote {} results to {}", outcomes.len(), path.display());
    Ok(())
}
