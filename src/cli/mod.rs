//! Command line interface

pub mod config;
pub mod error;
pub mod query;
pub mod reports;

pub use config::ConfigCommand;
pub use error::CliError;
pub use query::QueryArgs;
pub use reports::ReportsCommand;

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::output::{CsvRecordsWriter, JsonRecordsWriter, RecordsWriter};
use crate::records::Record;

/// Largest worker pool accepted on the command line
const MAX_WORKERS: usize = 32;

/// Parse and validate the worker pool size
fn parse_max_workers(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("max workers must be at least 1".to_string());
    }
    if value > MAX_WORKERS {
        return Err(format!("max workers {value} exceeds maximum of {MAX_WORKERS}"));
    }
    Ok(value)
}

/// Record output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Pretty-printed JSON array
    Json,
}

/// ENTSO-E Transparency Platform client
#[derive(Parser, Debug)]
#[command(name = "entsoe-client")]
#[command(about = "Query the ENTSO-E Transparency Platform", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (csv or json)
    #[arg(long, global = true, value_enum, default_value = "csv")]
    pub output_format: OutputFormat,

    /// Total attempts per request for transient failures (default: 5, range: 1-20)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: Option<u32>,

    /// Concurrent range chunks (default: 4, max: 32)
    ///
    /// Windows longer than a report's day limit are split into chunks that are
    /// fetched in parallel. The request throttle is shared by all workers.
    #[arg(long, global = true, value_parser = parse_max_workers)]
    pub max_workers: Option<usize>,

    /// Per-request timeout in seconds (default: 5)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Fetch range chunks one after another
    #[arg(long, global = true, default_value_t = false)]
    pub sequential: bool,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query and write the flattened records
    Query(QueryArgs),

    /// List the built-in report presets
    Reports(ReportsCommand),

    /// Show the effective configuration
    Config(ConfigCommand),
}

impl Cli {
    /// Configuration from the environment with command line overrides applied
    pub fn load_config(&self) -> Result<Config, CliError> {
        let mut config = Config::from_env()?;
        if let Some(retries) = self.max_retries {
            config = config.with_retries(retries)?;
        }
        if let Some(workers) = self.max_workers {
            config = config.with_max_workers(workers)?;
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Run the selected command
    pub async fn execute(&self) -> Result<(), CliError> {
        match &self.command {
            Commands::Query(args) => args.execute(self).await,
            Commands::Reports(command) => command.execute(self.output_format),
            Commands::Config(command) => command.execute(self),
        }
    }
}

/// Write records to `path`, or stdout when no path is given
pub(crate) fn write_records(
    records: &[Record],
    format: OutputFormat,
    path: Option<&Path>,
) -> Result<u64, CliError> {
    let written = match (format, path) {
        (OutputFormat::Csv, Some(path)) => drain(CsvRecordsWriter::create(path)?, records)?,
        (OutputFormat::Json, Some(path)) => drain(JsonRecordsWriter::create(path)?, records)?,
        (OutputFormat::Csv, None) => drain(CsvRecordsWriter::from_writer(io::stdout().lock()), records)?,
        (OutputFormat::Json, None) => {
            drain(JsonRecordsWriter::from_writer(io::stdout().lock()), records)?
        }
    };
    if let Some(path) = path {
        info!("Wrote {} records to {}", written, path.display());
    }
    Ok(written)
}

fn drain<W: RecordsWriter>(mut writer: W, records: &[Record]) -> Result<u64, CliError> {
    writer.write_records(records)?;
    let written = writer.records_written();
    writer.finish()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_max_workers_bounds() {
        assert_eq!(parse_max_workers("1"), Ok(1));
        assert_eq!(parse_max_workers("32"), Ok(32));
        assert!(parse_max_workers("0").is_err());
        assert!(parse_max_workers("33").is_err());
        assert!(parse_max_workers("four").is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "entsoe-client",
            "reports",
            "--output-format",
            "json",
            "--max-retries",
            "3",
            "--sequential",
        ]);
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.max_retries, Some(3));
        assert!(cli.sequential);
        assert!(matches!(cli.command, Commands::Reports(_)));
    }

    #[test]
    fn test_max_retries_range() {
        let result = Cli::try_parse_from(["entsoe-client", "--max-retries", "21", "reports"]);
        assert!(result.is_err());
    }
}
