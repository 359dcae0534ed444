//! `validate` command

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use super::geocode::{geocode_addresses, write_ndjson};
use super::{report_summary, AddressInput, Cli, CliError};
use crate::output::{CsvReportWriter, OutputWriter, ValidationRow};
use crate::scheduler::config::{DEFAULT_MAX_NOT_CONFIRMED, DEFAULT_MIN_CONFIRMED};
use crate::validation::{ValidationStatus, ValidationThresholds};

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Address input
    #[command(flatten)]
    pub input: AddressInput,

    /// NDJSON output with the raw geocoding results
    #[arg(long)]
    pub output: PathBuf,

    /// CSV report: Original Address, Validation Result, Reason
    #[arg(long)]
    pub validation_output: PathBuf,

    /// Minimum confidence for CONFIRMED
    #[arg(long, default_value_t = DEFAULT_MIN_CONFIRMED)]
    pub min_confirmed: f64,

    /// Maximum confidence for NOT_CONFIRMED
    #[arg(long, default_value_t = DEFAULT_MAX_NOT_CONFIRMED)]
    pub max_not_confirmed: f64,
}

impl ValidateArgs {
    /// Geocode, classify and write both outputs
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let thresholds = ValidationThresholds::new(self.min_confirmed, self.max_not_confirmed)?;
        let addresses = self.input.read()?;
        let outcomes = geocode_addresses(cli, &self.input, addresses.clone()).await?;

        write_ndjson(&self.output, &outcomes)?;

        let mut report = CsvReportWriter::new(&self.validation_output, &ValidationRow::HEADERS)?;
        let mut counts = [0usize; 3];
        for (address, outcome) in addresses.iter().zip(&outcomes) {
            let verdict = thresholds.classify(outcome);
            counts[match verdict.status {
                ValidationStatus::Confirmed => 0,
                ValidationStatus::PartiallyConfirmed => 1,
                ValidationStatus::NotConfirmed => 2,
            }] += 1;
            report.write_row(&ValidationRow::new(address, &verdict))?;
        }
        report.close()?;

        info!(
            "Validation report written to {}: {} confirmed, {} partially confirmed, {} not confirmed",
            self.validation_output.display(),
            counts[0],
            counts[1],
            counts[2]
        );
        report_summary("validate", &outcomes);
        Ok(())
    }
}
