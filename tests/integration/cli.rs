//! Integration tests for the entsoe-client binary

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{ACTUAL_LOAD, TOKEN};

/// Binary isolated from the caller's environment and any `.env` file
fn entsoe_client(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("entsoe-client").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("ENTSOE_API")
        .env_remove("ENTSOE_BASE_URL")
        .env_remove("ENTSOE_RETRIES")
        .env_remove("ENTSOE_MAX_WORKERS")
        .env_remove("LOG_FORMAT");
    cmd
}

#[test]
fn test_reports_lists_presets() {
    let dir = TempDir::new().unwrap();
    let output = entsoe_client(&dir)
        .args(["reports", "--output-format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let presets: Value = serde_json::from_slice(&output.stdout).unwrap();
    let presets = presets.as_array().unwrap();
    assert!(presets
        .iter()
        .any(|preset| preset["code"] == "12.1.D" && preset["document_type"] == "A44"));
}

#[test]
fn test_missing_token_fails() {
    let dir = TempDir::new().unwrap();
    entsoe_client(&dir)
        .args(["query", "--report", "6.1.A"])
        .assert()
        .failure();
}

#[test]
fn test_config_redacts_token() {
    let dir = TempDir::new().unwrap();
    let output = entsoe_client(&dir)
        .env("ENTSOE_API", TOKEN)
        .args(["config", "--output-format", "json", "--max-workers", "8"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains(TOKEN));

    let config: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config[0]["security_token"], "****");
    assert_eq!(config[0]["max_workers"], 8);
}

#[test]
fn test_invalid_token_fails() {
    let dir = TempDir::new().unwrap();
    entsoe_client(&dir)
        .env("ENTSOE_API", "not-a-token")
        .arg("config")
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_writes_csv_with_timestamps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ACTUAL_LOAD, "text/xml"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("load.csv");
    let mut cmd = entsoe_client(&dir);
    cmd.env("ENTSOE_API", TOKEN)
        .env("ENTSOE_BASE_URL", server.uri())
        .env("ENTSOE_REQUESTS_PER_MINUTE", "0")
        .args([
            "query",
            "--report",
            "6.1.A",
            "--period-start",
            "202401010000",
            "--period-end",
            "202401020000",
            "--param",
            "outBiddingZone_Domain=10YCZ-CEPS-----N",
            "--domain",
            "time_series",
            "--timestamps",
            "--output",
        ])
        .arg(&output_path);

    let status = tokio::task::spawn_blocking(move || cmd.output().unwrap().status)
        .await
        .unwrap();
    assert!(status.success());

    let content = std::fs::read_to_string(&output_path).unwrap();
    let mut lines = content.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    let quantity = header
        .iter()
        .position(|column| *column == "period.point.quantity")
        .unwrap();
    let timestamp = header.iter().position(|column| *column == "timestamp").unwrap();

    let rows: Vec<Vec<&str>> = lines.map(|line| line.split(',').collect()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][quantity], "6512");
    assert_eq!(rows[2][timestamp], "2024-01-01T02:00:00+00:00");
}
