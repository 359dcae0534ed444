//! `standardize` command

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use super::geocode::{geocode_addresses, write_ndjson};
use super::{report_summary, AddressInput, Cli, CliError};
use crate::output::{CsvReportWriter, OutputWriter, StandardizedRow};
use crate::standardize::AddressTemplate;

/// Arguments for the standardize command
#[derive(Parser, Debug)]
pub struct StandardizeArgs {
    /// Address input
    #[command(flatten)]
    pub input: AddressInput,

    /// NDJSON output with the raw geocoding results
    #[arg(long)]
    pub output: PathBuf,

    /// Address template, e.g. "{housenumber} {street}, {postcode} {city}"
    #[arg(long)]
    pub format: String,

    /// CSV report: Original Address, Standardized Address
    #[arg(long)]
    pub standardized_output: PathBuf,
}

impl StandardizeArgs {
    /// Geocode, fill the template and write both outputs
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let template = AddressTemplate::parse(&self.format)?;
        info!(
            "Template fields: {}",
            template.fields().collect::<Vec<_>>().join(", ")
        );
        let addresses = self.input.read()?;
        let outcomes = geocode_addresses(cli, &self.input, addresses.clone()).await?;

        write_ndjson(&self.output, &outcomes)?;

        let mut report =
            CsvReportWriter::new(&self.standardized_output, &StandardizedRow::HEADERS)?;
        for (address, outcome) in addresses.iter().zip(&outcomes) {
            let standardized = template.standardize(outcome);
            report.write_row(&StandardizedRow {
                original_address: address,
                standardized_address: &standardized,
            })?;
        }
        let rows = report.rows_written();
        report.close()?;

        info!(
            "Standardized {} addresses into {}",
            rows,
            self.standardized_output.display()
        );
        report_summary("standardize", &outcomes);
        Ok(())
    }
}
