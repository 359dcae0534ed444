//! `reverse` command

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use super::geocode::write_ndjson;
use super::{report_summary, run_fetch_unit, Cli, CliError};
use crate::fetcher::reverse::{
    Coordinate, CoordinateOrder, ResponseFormat, ResultType, ReverseGeocodeFetcher,
};
use crate::input;

/// Arguments for the reverse command
#[derive(Parser, Debug)]
pub struct ReverseArgs {
    /// Input file: one coordinate pair per line, or a CSV with `--csv`
    #[arg(long)]
    pub input: PathBuf,

    /// Treat the input as CSV with a header row
    #[arg(long, default_value_t = false)]
    pub csv: bool,

    /// CSV column holding the latitude
    #[arg(long, default_value = "lat")]
    pub lat_column: String,

    /// CSV column holding the longitude
    #[arg(long, default_value = "lon")]
    pub lon_column: String,

    /// NDJSON output, one line per input line
    #[arg(long)]
    pub output: PathBuf,

    /// Axis order of the input pairs (plain text input only)
    #[arg(long, value_enum, default_value_t = CoordinateOrder::Latlon)]
    pub order: CoordinateOrder,

    /// Restrict results to one country (ISO 3166-1 alpha-2)
    #[arg(long)]
    pub country_code: Option<String>,

    /// Result granularity
    #[arg(long = "type", value_enum, default_value_t = ResultType::Address)]
    pub result_type: ResultType,

    /// Response shape requested from the API
    #[arg(long, value_enum, default_value_t = ResponseFormat::Json)]
    pub output_format: ResponseFormat,
}

impl ReverseArgs {
    /// Reverse geocode every coordinate and write the results
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let points = if self.csv {
            input::read_csv_coordinates(&self.input, &self.lat_column, &self.lon_column)?
        } else {
            let lines = input::read_lines(&self.input)?;
            parse_coordinates(&lines, self.order)
        };

        let fetcher = ReverseGeocodeFetcher::new(cli.api_client()?)
            .with_result_type(Some(self.result_type))
            .with_country_code(self.country_code.clone())
            .with_format(self.output_format);

        info!("Reverse geocoding {} coordinates", points.len());
        let outcomes = run_fetch_unit(cli, fetcher, points, "reverse geocoding").await?;

        write_ndjson(&self.output, &outcomes)?;
        report_summary("reverse", &outcomes);
        Ok(())
    }
}

/// Parse every line, keeping a `None` slot for lines that are not a valid point
pub fn parse_coordinates(lines: &[String], order: CoordinateOrder) -> Vec<Option<Coordinate>> {
    lines
        .iter()
        .enumerate()
        .map(|(row, line)| match Coordinate::parse(line, order) {
            Ok(point) => Some(point),
            Err(e) => {
                warn!("Skipping invalid coordinate at row {}: {}", row + 1, e);
                None
            }
        })
        .collect()
}
