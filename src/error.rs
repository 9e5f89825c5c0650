use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads transaction exports, aggregates them, or writes the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Wrapper for IO failures such as listing the upload folder.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the spreadsheet reader.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the delimited text reader.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when a file could be parsed neither as a spreadsheet nor as
    /// comma-delimited text.
    #[error("could not load {path}: as spreadsheet: {spreadsheet}; as CSV: {delimited}")]
    LoadFailed {
        path: PathBuf,
        spreadsheet: String,
        delimited: String,
    },

    /// Raised when a delimited record holds more fields than the header.
    #[error("{path} line {line}: record has {found} fields, header has {expected}")]
    RaggedRecord {
        path: PathBuf,
        line: u64,
        found: usize,
        expected: usize,
    },

    /// Raised when a loaded file lacks columns the aggregation depends on.
    #[error("{file} is missing required columns: {}", .columns.join(", "))]
    MissingColumns { file: PathBuf, columns: Vec<String> },

    /// Raised when the startup configuration does not validate.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when none of the files in the upload folder could be loaded.
    #[error("no readable transaction files in {0}")]
    NoReadableInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
