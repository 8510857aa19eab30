//! Flattening documents into tabular records
//!
//! Nested objects become dot-joined keys (`time_series.period.resolution`).
//! Arrays expand into one record per element; several arrays under one object
//! multiply out into their cross product.

use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::schema::Document;

/// One flat row, keys in document order
pub type Record = Map<String, Value>;

/// Key separator for nested fields
pub const SEPARATOR: &str = ".";

/// Fields dropped unless configured otherwise
pub const DEFAULT_IGNORE_FIELDS: &[&str] = &["m_rid", "time_series.m_rid"];

/// Record extraction errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordsError {
    /// Requested domain key is absent from every document
    #[error("domain '{domain}' not found in data. Available keys: {available:?}")]
    DomainNotFound {
        domain: String,
        available: Vec<String>,
    },
}

pub type RecordsResult<T> = Result<T, RecordsError>;

/// How documents are turned into records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOptions {
    /// Top-level key to flatten instead of the whole document
    pub domain: Option<String>,
    /// Full dotted paths to drop
    pub ignore_fields: Vec<String>,
    /// Drop repeated records, keeping the first
    pub deduplicate: bool,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            domain: None,
            ignore_fields: DEFAULT_IGNORE_FIELDS.iter().map(|s| s.to_string()).collect(),
            deduplicate: true,
        }
    }
}

impl RecordOptions {
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }
}

/// Flatten a JSON value into records, dropping `ignore_fields`
pub fn normalize_to_records(value: &Value, ignore_fields: &[String]) -> Vec<Record> {
    let mut records = flatten(value, "");
    if !ignore_fields.is_empty() {
        for record in &mut records {
            record.retain(|key, _| !ignore_fields.iter().any(|field| field == key));
        }
    }
    records
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{SEPARATOR}{key}")
    }
}

fn flatten(value: &Value, prefix: &str) -> Vec<Record> {
    match value {
        Value::Object(object) => {
            let mut records = vec![Record::new()];
            for (key, child) in object {
                let key = join_key(prefix, key);
                match child {
                    Value::Object(_) => {
                        records = cross(records, flatten(child, &key));
                    }
                    Value::Array(elements) => {
                        let expanded = expand(elements, &key);
                        // An empty list contributes no rows and no columns
                        if !expanded.is_empty() {
                            records = cross(records, expanded);
                        }
                    }
                    scalar => {
                        for record in &mut records {
                            record.insert(key.clone(), scalar.clone());
                        }
                    }
                }
            }
            records
        }
        Value::Array(elements) => elements
            .iter()
            .flat_map(|element| flatten(element, prefix))
            .collect(),
        scalar => {
            let mut record = Record::new();
            record.insert(prefix.to_string(), scalar.clone());
            vec![record]
        }
    }
}

fn expand(elements: &[Value], key: &str) -> Vec<Record> {
    elements
        .iter()
        .flat_map(|element| match element {
            Value::Object(_) | Value::Array(_) => flatten(element, key),
            scalar => {
                let mut record = Record::new();
                record.insert(key.to_string(), scalar.clone());
                vec![record]
            }
        })
        .collect()
}

fn cross(left: Vec<Record>, right: Vec<Record>) -> Vec<Record> {
    let mut combined = Vec::with_capacity(left.len() * right.len());
    for base in &left {
        for extra in &right {
            let mut record = base.clone();
            record.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            combined.push(record);
        }
    }
    combined
}

/// Remove repeated records, keeping first occurrences in order
pub fn deduplicate(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(Value::Object(record.clone()).to_string()))
        .collect()
}

/// Flatten documents into one record list
pub fn extract_records(documents: &[Document], options: &RecordOptions) -> RecordsResult<Vec<Record>> {
    let schemas: BTreeSet<&str> = documents.iter().map(Document::schema_name).collect();
    if schemas.len() > 1 {
        warn!(
            "Mixed document schemas detected: {:?}. This may result in inconsistent record structures.",
            schemas
        );
    }

    let values: Vec<Value> = documents.iter().map(Document::to_json).collect();

    let mut records = Vec::new();
    match &options.domain {
        Some(domain) => {
            let available: BTreeSet<&str> = values
                .iter()
                .filter_map(Value::as_object)
                .flat_map(|object| object.keys().map(String::as_str))
                .collect();
            if !available.contains(domain.as_str()) {
                return Err(RecordsError::DomainNotFound {
                    domain: domain.clone(),
                    available: available.into_iter().map(str::to_string).collect(),
                });
            }
            for value in &values {
                if let Some(section) = value.get(domain) {
                    records.extend(normalize_to_records(section, &options.ignore_fields));
                }
            }
        }
        None => {
            for value in &values {
                records.extend(normalize_to_records(value, &options.ignore_fields));
            }
        }
    }

    let total = records.len();
    let records = if options.deduplicate {
        deduplicate(records)
    } else {
        records
    };
    debug!(
        "Extracted {} records ({} before deduplication) from {} documents",
        records.len(),
        total,
        documents.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaType, XmlElement};
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_nested_objects_use_dot_keys() {
        let records = normalize_to_records(&json!({"nested": {"level1": {"level2": "value"}}}), &[]);
        assert_eq!(records, vec![record(json!({"nested.level1.level2": "value"}))]);
    }

    #[test]
    fn test_lists_expand_into_rows() {
        let data = json!({
            "user": "john",
            "orders": [{"id": 1, "amount": 100}, {"id": 2, "amount": 200}]
        });
        let records = normalize_to_records(&data, &[]);
        assert_eq!(
            records,
            vec![
                record(json!({"user": "john", "orders.id": 1, "orders.amount": 100})),
                record(json!({"user": "john", "orders.id": 2, "orders.amount": 200})),
            ]
        );
    }

    #[test]
    fn test_sibling_lists_cross_multiply() {
        let data = json!({"a": [1, 2], "b": ["x", "y", "z"]});
        let records = normalize_to_records(&data, &[]);
        assert_eq!(records.len(), 6);
        assert_eq!(records[0], record(json!({"a": 1, "b": "x"})));
        assert_eq!(records[5], record(json!({"a": 2, "b": "z"})));
    }

    #[test]
    fn test_fields_after_a_list_are_kept() {
        let data = json!({"points": [{"q": 1}, {"q": 2}], "unit": "MAW"});
        let records = normalize_to_records(&data, &[]);
        assert_eq!(
            records,
            vec![
                record(json!({"points.q": 1, "unit": "MAW"})),
                record(json!({"points.q": 2, "unit": "MAW"})),
            ]
        );
    }

    #[test]
    fn test_ignore_fields() {
        let data = json!({"m_rid": "123", "user": "john", "orders": [{"id": 1}]});
        let records = normalize_to_records(&data, &["m_rid".to_string()]);
        assert_eq!(records, vec![record(json!({"user": "john", "orders.id": 1}))]);
    }

    #[test]
    fn test_empty_list_is_skipped() {
        let records = normalize_to_records(&json!({"a": 1, "b": []}), &[]);
        assert_eq!(records, vec![record(json!({"a": 1}))]);
    }

    #[test]
    fn test_deduplicate_preserves_order() {
        let records = vec![
            record(json!({"a": 1})),
            record(json!({"a": 2})),
            record(json!({"a": 1})),
        ];
        assert_eq!(
            deduplicate(records),
            vec![record(json!({"a": 1})), record(json!({"a": 2}))]
        );
    }

    fn gl_document(m_rid: &str, quantity: &str) -> Document {
        let root = XmlElement::new("GL_MarketDocument")
            .with_child(XmlElement::new("mRID").with_text(m_rid))
            .with_child(
                XmlElement::new("TimeSeries")
                    .with_child(XmlElement::new("mRID").with_text("1"))
                    .with_child(
                        XmlElement::new("Period").with_child(
                            XmlElement::new("Point")
                                .with_child(XmlElement::new("position").with_text("1"))
                                .with_child(XmlElement::new("quantity").with_text(quantity)),
                        ),
                    ),
            );
        Document::market(SchemaType::market("GL_MarketDocument", "urn:gl"), root)
    }

    #[test]
    fn test_extract_records_drops_ids_and_duplicates() {
        let documents = vec![gl_document("a", "10"), gl_document("b", "10")];
        let records = extract_records(&documents, &RecordOptions::default()).unwrap();

        // Identical once m_rid fields are gone
        assert_eq!(records.len(), 1);
        assert!(!records[0].contains_key("m_rid"));
        assert!(!records[0].contains_key("time_series.m_rid"));
        assert_eq!(records[0]["time_series.period.point.quantity"], json!(10));

        let all = extract_records(&documents, &RecordOptions::default().with_deduplicate(false))
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_extract_records_domain() {
        let documents = vec![gl_document("a", "10")];
        let records =
            extract_records(&documents, &RecordOptions::default().with_domain("time_series"))
                .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["period.point.position"], json!(1));
        assert_eq!(records[0]["period.point.quantity"], json!(10));
        // Paths are relative to the domain
        assert!(!records[0].contains_key("m_rid"));
    }

    #[test]
    fn test_extract_records_missing_domain() {
        let documents = vec![gl_document("a", "10")];
        let err = extract_records(&documents, &RecordOptions::default().with_domain("nope"))
            .unwrap_err();
        match err {
            RecordsError::DomainNotFound { domain, available } => {
                assert_eq!(domain, "nope");
                assert_eq!(available, vec!["m_rid", "time_series"]);
            }
        }
    }
}
