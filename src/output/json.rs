//! JSON output writer, one pretty-printed array of records

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use super::{create_file, OutputError, OutputResult, RecordsWriter};
use crate::records::Record;

/// JSON array writer for records
pub struct JsonRecordsWriter<W: Write = BufWriter<File>> {
    sink: W,
    records_written: u64,
}

impl JsonRecordsWriter<BufWriter<File>> {
    /// Write to a file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Ok(Self::from_writer(create_file(path.as_ref())?))
    }
}

impl<W: Write> JsonRecordsWriter<W> {
    pub fn from_writer(sink: W) -> Self {
        Self {
            sink,
            records_written: 0,
        }
    }

    /// Close the array and return the sink
    pub fn into_inner(mut self) -> OutputResult<W> {
        self.close_array()?;
        Ok(self.sink)
    }

    fn io(e: std::io::Error) -> OutputError {
        OutputError::IoError(e.to_string())
    }

    fn close_array(&mut self) -> OutputResult<()> {
        let closing: &[u8] = if self.records_written == 0 { b"[]\n" } else { b"\n]\n" };
        self.sink.write_all(closing).map_err(Self::io)?;
        self.sink
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }
}

impl<W: Write> RecordsWriter for JsonRecordsWriter<W> {
    fn write_records(&mut self, records: &[Record]) -> OutputResult<()> {
        for record in records {
            let separator: &[u8] = if self.records_written == 0 { b"[\n" } else { b",\n" };
            self.sink.write_all(separator).map_err(Self::io)?;
            serde_json::to_writer_pretty(&mut self.sink, record)
                .map_err(|e| OutputError::SerializationError(e.to_string()))?;
            self.records_written += 1;
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.sink
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn finish(mut self) -> OutputResult<()> {
        self.close_array()?;
        debug!("JSON writer finished: {} records", self.records_written);
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.records_written
    }
}
