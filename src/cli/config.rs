//! CLI command for inspecting the effective configuration

use clap::Args;
use serde_json::{json, Value};

use super::{write_records, Cli, CliError};
use crate::config::Config;
use crate::query::Backoff;
use crate::records::Record;

/// Config subcommand
#[derive(Debug, Args)]
pub struct ConfigCommand {}

impl ConfigCommand {
    /// Validate the configuration and print it with the token redacted
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = cli.load_config()?;
        write_records(&[config_record(&config)], cli.output_format, None)?;
        Ok(())
    }
}

fn config_record(config: &Config) -> Record {
    let backoff = match config.retry.backoff {
        Backoff::Exponential => "exponential".to_string(),
        Backoff::Constant(delay) => format!("constant {}s", delay.as_secs_f64()),
    };

    let row = json!({
        "security_token": config.security_token().to_string(),
        "base_url": config.base_url,
        "timeout_secs": config.timeout.as_secs_f64(),
        "retries": config.retry.retries,
        "backoff": backoff,
        "max_workers": config.max_workers,
        "requests_per_minute": config.requests_per_minute,
    });
    match row {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
