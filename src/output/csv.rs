//! CSV output writer
//!
//! Columns are the union of the first batch's keys in first-seen order; cells
//! for keys a record lacks stay empty. Keys first seen in later batches are
//! dropped.

use csv::Writer;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::{create_file, OutputError, OutputResult, RecordsWriter};
use crate::records::Record;

/// Flush after this many records
const FLUSH_INTERVAL: u64 = 1000;

/// CSV writer for records
pub struct CsvRecordsWriter<W: Write = BufWriter<File>> {
    writer: Writer<W>,
    columns: Option<Vec<String>>,
    records_written: u64,
}

impl CsvRecordsWriter<BufWriter<File>> {
    /// Write to a file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Ok(Self::from_writer(create_file(path.as_ref())?))
    }
}

impl<W: Write> CsvRecordsWriter<W> {
    /// Write to any sink
    pub fn from_writer(sink: W) -> Self {
        Self {
            writer: Writer::from_writer(sink),
            columns: None,
            records_written: 0,
        }
    }

    /// Header columns, once the first batch is written
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Flush and return the sink
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }
}

/// Union of keys in first-seen order
fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for key in records.iter().flat_map(|record| record.keys()) {
        if seen.insert(key.as_str()) {
            columns.push(key.clone());
        }
    }
    columns
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

impl<W: Write> RecordsWriter for CsvRecordsWriter<W> {
    fn write_records(&mut self, records: &[Record]) -> OutputResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        if self.columns.is_none() {
            let columns = collect_columns(records);
            self.writer
                .write_record(&columns)
                .map_err(|e| OutputError::CsvError(format!("Failed to write header: {}", e)))?;
            debug!("CSV header written with {} columns", columns.len());
            self.columns = Some(columns);
        }
        let columns = self.columns.as_deref().unwrap_or_default();

        let known: HashSet<&str> = columns.iter().map(String::as_str).collect();
        if let Some(extra) = records
            .iter()
            .flat_map(|record| record.keys())
            .find(|key| !known.contains(key.as_str()))
        {
            warn!("Dropping column '{}' not present in the CSV header", extra);
        }

        for record in records {
            let row: Vec<String> = columns.iter().map(|column| cell(record.get(column))).collect();
            self.writer
                .write_record(&row)
                .map_err(|e| OutputError::CsvError(format!("Failed to write record: {}", e)))?;

            self.records_written += 1;
            if self.records_written % FLUSH_INTERVAL == 0 {
                self.writer
                    .flush()
                    .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))?;
                debug!("Progress: {} records written", self.records_written);
            }
        }

        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn finish(mut self) -> OutputResult<()> {
        self.flush()?;
        debug!("CSV writer finished: {} records", self.records_written);
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.records_written
    }
}
