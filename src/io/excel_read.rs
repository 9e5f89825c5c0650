use std::path::Path;

use calamine::{DataType, Reader, Sheets, open_workbook_auto};

use crate::error::Result;
use crate::model::{Cell, Frame};

/// Reads the first worksheet of a spreadsheet into a frame, using the first
/// row as the header.
pub fn read_frame(path: &Path) -> Result<Frame> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Frame::new(path, Vec::new(), Vec::new())),
    };

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_name).collect(),
        None => Vec::new(),
    };

    let rows = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Ok(Frame::new(path, columns, rows))
}

fn header_name(cell: &DataType) -> String {
    match cell {
        DataType::String(value) => value.trim().to_string(),
        DataType::Empty => String::new(),
        other => cell_from_data(other).to_string(),
    }
}

/// Maps a spreadsheet cell onto the crate's cell model. Whole numbers load as
/// integers so that counts and identifiers do not read as fractions.
pub(crate) fn cell_from_data(cell: &DataType) -> Cell {
    match cell {
        DataType::String(value) if value.is_empty() => Cell::Empty,
        DataType::String(value) => Cell::Text(value.clone()),
        DataType::Float(value) => float_cell(*value),
        DataType::Int(value) => Cell::Int(*value),
        DataType::Bool(value) => Cell::Bool(*value),
        DataType::DateTime(value) => Cell::DateTime(*value),
        DataType::Empty => Cell::Empty,
        DataType::Error(_) => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

fn float_cell(value: f64) -> Cell {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Cell::Int(value as i64)
    } else {
        Cell::Float(value)
    }
}
