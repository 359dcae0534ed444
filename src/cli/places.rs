//! `places` command

use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::{create_progress_bar, Cli, CliError};
use crate::fetcher::pagination::{DrainStop, Drained, PageDrain};
use crate::fetcher::places::feature_properties;
use crate::fetcher::PlacesFetcher;
use crate::grid::{self, BoundingBox};
use crate::output::{NdjsonWriter, OutputWriter};
use crate::scheduler::config::{DEFAULT_CELL_SIZE_KM, DEFAULT_PAGE_SIZE};
use crate::scheduler::BatchScheduler;

/// Arguments for the places command
#[derive(Parser, Debug)]
pub struct PlacesArgs {
    /// Bounding box as min_lon,min_lat,max_lon,max_lat
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: BoundingBox,

    /// Comma-separated place categories, e.g. "catering.restaurant,catering.cafe"
    #[arg(long, default_value = "")]
    pub categories: String,

    /// Maximum grid cell size in km (at most 5)
    #[arg(long, default_value_t = DEFAULT_CELL_SIZE_KM)]
    pub grid_size: f64,

    /// Results requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// NDJSON output, one line per place
    #[arg(long, default_value = "output.ndjson")]
    pub output: PathBuf,
}

impl PlacesArgs {
    /// Partition the box, drain every cell and write each place's properties
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = cli.batch_config().with_page_size(self.page_size);
        let progress = create_progress_bar(0, "grid cells");
        let scheduler = BatchScheduler::new(&config)?.with_progress(progress.clone());

        let cells = grid::partition(&self.bbox, self.grid_size)?;
        info!(
            "Grid calculated: {} cells of at most {} km",
            cells.len(),
            self.grid_size
        );
        progress.set_length(cells.len() as u64);

        let fetcher = Arc::new(PlacesFetcher::new(cli.api_client()?, self.categories.clone()));
        let drain = PageDrain::new(config.page_size);
        let retry = cli.retry_policy();

        let results = scheduler
            .run(cells, move |item| {
                let fetcher = fetcher.clone();
                async move { fetcher.drain_cell(&item.payload, &drain, &retry).await }
            })
            .await?;
        progress.finish_and_clear();

        let drained: Vec<Drained<Value>> = results.into_iter().map(|r| r.outcome).collect();
        let incomplete = log_incomplete_cells(&drained);

        let places: Vec<Value> = drained
            .into_iter()
            .flat_map(|cell| cell.items)
            .map(feature_properties)
            .collect();

        let mut writer = NdjsonWriter::new(&self.output)?;
        writer.write_all(&places)?;
        writer.close()?;

        info!(
            "Saved {} places to {} ({} cells incomplete)",
            places.len(),
            self.output.display(),
            incomplete
        );
        Ok(())
    }
}

/// Warn about every cell whose drain stopped early; returns how many did
fn log_incomplete_cells(drained: &[Drained<Value>]) -> usize {
    let mut incomplete = 0;
    for (index, cell) in drained.iter().enumerate() {
        match &cell.stop {
            DrainStop::Exhausted => {}
            DrainStop::Failed(outcome) => {
                incomplete += 1;
                warn!(
                    index = index,
                    pages = cell.pages,
                    "Cell {} stopped after a failed page ({}); kept {} places",
                    index + 1,
                    outcome.describe(),
                    cell.items.len()
                );
            }
            DrainStop::PageLimit => {
                incomplete += 1;
                warn!(
                    index = index,
                    pages = cell.pages,
                    "Cell {} hit the page limit; kept {} places",
                    index + 1,
                    cell.items.len()
                );
            }
        }
    }
    incomplete
}
