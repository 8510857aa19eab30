//! Record output writers

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::records::Record;

pub mod csv;
pub mod json;

pub use self::csv::CsvRecordsWriter;
pub use self::json::JsonRecordsWriter;

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes flattened records
pub trait RecordsWriter {
    /// Write a batch of records
    fn write_records(&mut self, records: &[Record]) -> OutputResult<()>;

    /// Flush buffered data
    fn flush(&mut self) -> OutputResult<()>;

    /// Finalize the output
    fn finish(self) -> OutputResult<()>;

    /// Records written so far
    fn records_written(&self) -> u64;
}

/// Buffered file, parent directories created as needed
pub(crate) fn create_file(path: &Path) -> OutputResult<BufWriter<File>> {
    info!("Creating output file: path={}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
    }

    let file = File::create(path)
        .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;
    Ok(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file))
}
