//! File adapters: spreadsheet and delimited readers for transaction exports
//! and the workbook writer for the report.

pub mod csv_read;
pub mod excel_read;
pub mod excel_write;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::{ReportError, Result};
use crate::model::Frame;

/// Lists the regular files in `folder` in directory enumeration order.
pub fn list_input_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// Loads one transaction export, trying the spreadsheet reader first and
/// falling back to comma-delimited text.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_frame(path: &Path) -> Result<Frame> {
    let spreadsheet_error = match excel_read::read_frame(path) {
        Ok(frame) => {
            debug!(rows = frame.rows().len(), "loaded as spreadsheet");
            return Ok(frame);
        }
        Err(error) => error,
    };
    debug!(error = %spreadsheet_error, "not a spreadsheet, trying CSV");

    match csv_read::read_frame(path) {
        Ok(frame) => {
            debug!(rows = frame.rows().len(), "loaded as CSV");
            Ok(frame)
        }
        Err(csv_error) => Err(ReportError::LoadFailed {
            path: path.to_path_buf(),
            spreadsheet: spreadsheet_error.to_string(),
            delimited: csv_error.to_string(),
        }),
    }
}
