//! Unit tests for turning parsed documents into timestamped records

use entsoe_client::output::{CsvRecordsWriter, JsonRecordsWriter, RecordsWriter};
use entsoe_client::query::document::DocumentParser;
use entsoe_client::records::{extract_records, RecordOptions};
use entsoe_client::timestamps::{add_timestamps, IntervalEdge, TimestampFields};
use entsoe_client::Document;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::common::{xml_payload, ACTUAL_LOAD, NO_DATA};

fn actual_load() -> Document {
    DocumentParser::default()
        .parse(&xml_payload(ACTUAL_LOAD))
        .unwrap()
        .expect("market document")
}

#[test]
fn test_no_data_acknowledgement_yields_nothing() {
    let parsed = DocumentParser::default().parse(&xml_payload(NO_DATA)).unwrap();
    assert!(parsed.is_none());
}

#[test]
fn test_points_become_records() {
    let document = actual_load();
    assert_eq!(document.schema_name(), "GL_MarketDocument");

    let records = extract_records(&[document], &RecordOptions::default()).unwrap();
    assert_eq!(records.len(), 3);

    let quantities: Vec<&Value> = records
        .iter()
        .map(|record| &record["time_series.period.point.quantity"])
        .collect();
    assert_eq!(quantities, vec![&json!(6512), &json!(6380), &json!(6297)]);
    assert!(records.iter().all(|record| !record.contains_key("m_rid")));
    assert!(records
        .iter()
        .all(|record| record["time_series.period.resolution"] == json!("PT60M")));
}

#[test]
fn test_timestamps_for_each_point() {
    let records = extract_records(&[actual_load()], &RecordOptions::default()).unwrap();

    let starts = add_timestamps(records.clone(), &TimestampFields::default());
    let starts: Vec<&Value> = starts.iter().map(|record| &record["timestamp"]).collect();
    assert_eq!(
        starts,
        vec![
            &json!("2024-01-01T00:00:00+00:00"),
            &json!("2024-01-01T01:00:00+00:00"),
            &json!("2024-01-01T02:00:00+00:00"),
        ]
    );

    let ends = add_timestamps(
        records,
        &TimestampFields::default().with_edge(IntervalEdge::End),
    );
    assert_eq!(ends[2]["timestamp"], json!("2024-01-01T03:00:00+00:00"));
}

#[test]
fn test_domain_selects_time_series() {
    let records = extract_records(
        &[actual_load()],
        &RecordOptions::default().with_domain("time_series"),
    )
    .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["period.point.position"], json!(1));
    assert!(!records[0].contains_key("type"), "document header is left out");
}

#[test]
fn test_records_written_to_csv_and_json() {
    let dir = TempDir::new().unwrap();
    let records = add_timestamps(
        extract_records(
            &[actual_load()],
            &RecordOptions::default().with_domain("time_series"),
        )
        .unwrap(),
        &TimestampFields::default(),
    );

    let csv_path = dir.path().join("load.csv");
    let mut csv = CsvRecordsWriter::create(&csv_path).unwrap();
    csv.write_records(&records).unwrap();
    assert_eq!(csv.records_written(), 3);
    csv.finish().unwrap();

    let content = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = content.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("period.point.quantity"));
    assert!(header.ends_with("timestamp"));
    assert_eq!(lines.count(), 3);

    let json_path = dir.path().join("out").join("load.json");
    let mut json = JsonRecordsWriter::create(&json_path).unwrap();
    json.write_records(&records).unwrap();
    json.finish().unwrap();

    let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["period.point.quantity"], json!(6380));
}
