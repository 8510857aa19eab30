//! CLI error types and conversions

use crate::config::ConfigError;
use crate::output::OutputError;
use crate::params::ParamsError;
use crate::query::QueryError;
use crate::records::RecordsError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Parameter error
    #[error("parameter error: {0}")]
    ParamsError(#[from] ParamsError),

    /// Query error
    #[error("query error: {0}")]
    QueryError(#[from] QueryError),

    /// Record extraction error
    #[error("records error: {0}")]
    RecordsError(#[from] RecordsError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
