//! Query command: build parameters, run the pipeline, write records

use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use super::{write_records, Cli, CliError};
use crate::params::{parse_pair, ParamsBuilder, QueryOptions, QueryParams};
use crate::query::{ExecutionMode, QueryClient};
use crate::records::{extract_records, RecordOptions};
use crate::reports::{self, ReportPreset};
use crate::timestamps::{add_timestamps, IntervalEdge, TimestampFields};

/// Query command arguments
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Report preset code (see `entsoe-client reports`), e.g. 6.1.A
    #[arg(long, conflicts_with = "document_type", required_unless_present = "document_type")]
    pub report: Option<String>,

    /// Raw documentType code, e.g. A65
    #[arg(long)]
    pub document_type: Option<String>,

    /// Extra wire field as key=value (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Window start (YYYYMMDDHHMM)
    #[arg(long, requires = "period_end")]
    pub period_start: Option<i64>,

    /// Window end (YYYYMMDDHHMM)
    #[arg(long, requires = "period_start")]
    pub period_end: Option<i64>,

    /// Update window start (YYYYMMDDHHMM)
    #[arg(long, requires = "period_end_update")]
    pub period_start_update: Option<i64>,

    /// Update window end (YYYYMMDDHHMM)
    #[arg(long, requires = "period_start_update")]
    pub period_end_update: Option<i64>,

    /// First page offset; enables pagination
    #[arg(long)]
    pub offset: Option<u32>,

    /// in_Domain EIC code
    #[arg(long)]
    pub in_domain: Option<String>,

    /// out_Domain EIC code
    #[arg(long)]
    pub out_domain: Option<String>,

    /// Largest window in days per request
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_days: Option<u32>,

    /// Documents per page
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub offset_increment: Option<u32>,

    /// Flatten only this top-level key of each document, e.g. time_series
    #[arg(long)]
    pub domain: Option<String>,

    /// Add a timestamp column computed from start, resolution and position
    #[arg(long, default_value_t = false)]
    pub timestamps: bool,

    /// Which edge of each interval the timestamp marks
    #[arg(long, value_enum, default_value_t = IntervalEdge::Start)]
    pub interval_edge: IntervalEdge,

    /// Keep repeated records
    #[arg(long, default_value_t = false)]
    pub no_dedup: bool,

    /// Output file (stdout when absent)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl QueryArgs {
    /// Resolve the preset, if any
    pub fn preset(&self) -> Result<Option<&'static ReportPreset>, CliError> {
        match &self.report {
            None => Ok(None),
            Some(code) => reports::find(code).map(Some).ok_or_else(|| {
                CliError::InvalidArgument(format!(
                    "unknown report '{code}'. Run 'entsoe-client reports' to list codes"
                ))
            }),
        }
    }

    /// Parameters and pipeline options for this invocation
    pub fn build(&self) -> Result<(QueryParams, QueryOptions), CliError> {
        let preset = self.preset()?;

        let (mut builder, mut options) = match (preset, &self.document_type) {
            (Some(preset), _) => (preset.builder(), preset.options()),
            (None, Some(document_type)) => {
                (ParamsBuilder::new(document_type.as_str()), QueryOptions::default())
            }
            (None, None) => {
                return Err(CliError::InvalidArgument(
                    "either --report or --document-type is required".to_string(),
                ))
            }
        };

        if let (Some(start), Some(end)) = (self.period_start, self.period_end) {
            builder = builder.period(start, end);
        }
        if let (Some(start), Some(end)) = (self.period_start_update, self.period_end_update) {
            builder = builder.update_period(start, end);
        }
        if let Some(eic) = &self.in_domain {
            builder = builder.in_domain(eic.as_str());
        }
        if let Some(eic) = &self.out_domain {
            builder = builder.out_domain(eic.as_str());
        }
        for raw in &self.params {
            let (key, value) = parse_pair(raw)?;
            builder = builder.param(key, value);
        }
        if let Some(offset) = self.offset {
            builder = builder.offset(offset);
        }

        if let Some(days) = self.max_days {
            options = options.with_max_days_limit(days);
        }
        if let Some(increment) = self.offset_increment {
            options = options.with_offset_increment(increment);
        }

        let params = builder.build();
        if let Some(preset) = preset {
            preset.validate(&params)?;
        }
        Ok((params, options))
    }

    /// Execute the query command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let (params, options) = self.build()?;
        let config = cli.load_config()?;

        let mut client = QueryClient::new(&config)?;
        if cli.sequential {
            client = client.with_mode(ExecutionMode::Sequential);
        }

        let documents = client.query(params, options).await?;
        if documents.is_empty() {
            warn!("No documents matched the query");
        }

        let mut record_options = RecordOptions::default().with_deduplicate(!self.no_dedup);
        if let Some(domain) = &self.domain {
            record_options = record_options.with_domain(domain.as_str());
        }
        let mut records = extract_records(&documents, &record_options)?;
        if self.timestamps {
            records = add_timestamps(records, &TimestampFields::default().with_edge(self.interval_edge));
        }

        let written = write_records(&records, cli.output_format, self.output.as_deref())?;
        info!("Query complete: {} documents, {} records", documents.len(), written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use crate::params::{ParamValue, OFFSET, PERIOD_END, PERIOD_START};
    use clap::Parser;

    fn query_args(args: &[&str]) -> QueryArgs {
        let cli = Cli::parse_from(["entsoe-client", "query"].iter().chain(args));
        match cli.command {
            Commands::Query(args) => args,
            other => panic!("expected query command, got {other:?}"),
        }
    }

    #[test]
    fn test_report_preset_seeds_params() {
        let args = query_args(&[
            "--report",
            "6.1.A",
            "--period-start",
            "202401010000",
            "--period-end",
            "202401020000",
            "--param",
            "outBiddingZone_Domain=10YCZ-CEPS-----N",
        ]);
        let (params, options) = args.build().unwrap();

        assert_eq!(params.get("documentType"), Some(&ParamValue::from("A65")));
        assert_eq!(params.get("processType"), Some(&ParamValue::from("A16")));
        assert_eq!(params.get_i64(PERIOD_START), Some(202401010000));
        assert_eq!(params.get_i64(PERIOD_END), Some(202401020000));
        assert!(params.contains("outBiddingZone_Domain"));
        assert_eq!(options, QueryOptions::default());
    }

    #[test]
    fn test_document_type_with_overrides() {
        let args = query_args(&[
            "--document-type",
            "A80",
            "--offset",
            "0",
            "--max-days",
            "30",
            "--offset-increment",
            "200",
        ]);
        let (params, options) = args.build().unwrap();

        assert_eq!(params.get_i64(OFFSET), Some(0));
        assert_eq!(options.max_days_limit, 30);
        assert_eq!(options.offset_increment, 200);
    }

    #[test]
    fn test_unknown_report() {
        let args = query_args(&["--report", "99.9.Z"]);
        assert!(matches!(args.build(), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_preset_domain_rule_enforced() {
        let args = query_args(&[
            "--report",
            "12.1.D",
            "--in-domain",
            "10YNL----------L",
            "--out-domain",
            "10YBE----------2",
        ]);
        assert!(matches!(args.build(), Err(CliError::ParamsError(_))));
    }

    #[test]
    fn test_report_and_document_type_conflict() {
        let result = Cli::try_parse_from([
            "entsoe-client",
            "query",
            "--report",
            "6.1.A",
            "--document-type",
            "A65",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_period_bounds_come_in_pairs() {
        let result = Cli::try_parse_from([
            "entsoe-client",
            "query",
            "--document-type",
            "A65",
            "--period-start",
            "202401010000",
        ]);
        assert!(result.is_err());
    }
}
