//! CLI error types and conversions

use crate::fetcher::FetcherError;
use crate::grid::GridError;
use crate::input::InputError;
use crate::output::OutputError;
use crate::scheduler::SchedulerError;
use crate::standardize::TemplateError;
use crate::validation::ValidationError;

/// CLI errors. Each one aborts the command; per-item failures never get here.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Fetcher setup error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Grid configuration error
    #[error("grid error: {0}")]
    GridError(#[from] GridError),

    /// Input error
    #[error("input error: {0}")]
    InputError(#[from] InputError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Scheduler error
    #[error("scheduler error: {0}")]
    SchedulerError(#[from] SchedulerError),

    /// Address template error
    #[error("template error: {0}")]
    TemplateError(#[from] TemplateError),

    /// Validation threshold error
    #[error("validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
