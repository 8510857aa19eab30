//! Unit tests for command line parsing

use clap::Parser;
use entsoe_client::cli::{Cli, Commands, OutputFormat};
use entsoe_client::params::{ParamValue, PERIOD_END_UPDATE, PERIOD_START_UPDATE};
use entsoe_client::timestamps::IntervalEdge;

#[test]
fn test_cli_defaults() {
    let cli = Cli::parse_from(["entsoe-client", "query", "--report", "6.1.A"]);

    assert_eq!(cli.output_format, OutputFormat::Csv);
    assert_eq!(cli.max_retries, None, "retries fall back to the configuration");
    assert_eq!(cli.max_workers, None);
    assert!(!cli.sequential);
}

#[test]
fn test_cli_respects_custom_globals() {
    let cli = Cli::parse_from([
        "entsoe-client",
        "--max-retries",
        "10",
        "--max-workers",
        "8",
        "--timeout",
        "30",
        "query",
        "--report",
        "6.1.A",
    ]);

    assert_eq!(cli.max_retries, Some(10));
    assert_eq!(cli.max_workers, Some(8));
    assert_eq!(cli.timeout, Some(30));
}

#[test]
fn test_cli_rejects_out_of_range_globals() {
    for args in [
        ["entsoe-client", "--max-retries", "0", "reports"],
        ["entsoe-client", "--max-retries", "21", "reports"],
        ["entsoe-client", "--max-workers", "0", "reports"],
        ["entsoe-client", "--max-workers", "33", "reports"],
    ] {
        assert!(Cli::try_parse_from(args).is_err(), "{args:?} should be rejected");
    }
}

#[test]
fn test_query_requires_report_or_document_type() {
    assert!(Cli::try_parse_from(["entsoe-client", "query"]).is_err());
}

#[test]
fn test_query_update_window_and_timestamps() {
    let cli = Cli::parse_from([
        "entsoe-client",
        "query",
        "--document-type",
        "A80",
        "--period-start-update",
        "202401010000",
        "--period-end-update",
        "202401080000",
        "--param",
        "BiddingZone_Domain=10YNL----------L",
        "--timestamps",
        "--interval-edge",
        "end",
        "--no-dedup",
    ]);

    let Commands::Query(args) = cli.command else {
        panic!("expected query command");
    };
    assert!(args.timestamps);
    assert_eq!(args.interval_edge, IntervalEdge::End);
    assert!(args.no_dedup);

    let (params, _) = args.build().unwrap();
    assert_eq!(params.get_i64(PERIOD_START_UPDATE), Some(202401010000));
    assert_eq!(params.get_i64(PERIOD_END_UPDATE), Some(202401080000));
    assert_eq!(
        params.get("BiddingZone_Domain"),
        Some(&ParamValue::from("10YNL----------L"))
    );
}

#[test]
fn test_outage_preset_options() {
    let cli = Cli::parse_from(["entsoe-client", "query", "--report", "15.1.A_B"]);
    let Commands::Query(args) = cli.command else {
        panic!("expected query command");
    };

    let (params, options) = args.build().unwrap();
    assert_eq!(params.get_i64("offset"), Some(0), "outage reports are paginated");
    assert_eq!(options.offset_increment, 200);
}

#[test]
fn test_malformed_param_pair() {
    let cli = Cli::parse_from([
        "entsoe-client",
        "query",
        "--document-type",
        "A65",
        "--param",
        "processType",
    ]);
    let Commands::Query(args) = cli.command else {
        panic!("expected query command");
    };
    assert!(args.build().is_err());
}
