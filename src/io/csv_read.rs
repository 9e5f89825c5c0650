use std::path::Path;

use csv::ReaderBuilder;

use crate::aggregate::IDENTIFIER_COLUMNS;
use crate::error::{ReportError, Result};
use crate::model::{Cell, Frame};

/// Markers treated as missing values in delimited exports.
const NA_MARKERS: &[&str] = &["NaN", "nan", "NA", "N/A", "n/a", "null", "NULL", "None", "#N/A"];

/// Value type shared by every field of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Boolean,
    Text,
}

/// Reads a comma-delimited file with a header row into a frame.
///
/// Types are inferred per column: a column is numeric only when every
/// non-missing field parses as a number, otherwise its fields stay text.
/// Identifier columns are always text so `0123` and `123` stay distinct.
/// Records shorter than the header are padded; longer ones are an error.
pub fn read_frame(path: &Path) -> Result<Frame> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > columns.len() {
            return Err(ReportError::RaggedRecord {
                path: path.to_path_buf(),
                line: record.position().map(|pos| pos.line()).unwrap_or_default(),
                found: record.len(),
                expected: columns.len(),
            });
        }
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if IDENTIFIER_COLUMNS.contains(&name.as_str()) {
                ColumnKind::Text
            } else {
                infer_kind(raw_rows.iter().filter_map(|row| row.get(idx).map(String::as_str)))
            }
        })
        .collect();

    let rows = raw_rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&kinds)
                .map(|(raw, kind)| typed_field(raw, *kind))
                .collect()
        })
        .collect();

    Ok(Frame::new(path, columns, rows))
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || NA_MARKERS.contains(&raw)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

fn infer_kind<'a>(fields: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut numeric = true;
    let mut boolean = true;
    let mut seen = false;

    for raw in fields.filter(|raw| !is_missing(raw)) {
        seen = true;
        let trimmed = raw.trim();
        numeric &= trimmed.parse::<f64>().is_ok();
        boolean &= parse_bool(trimmed).is_some();
        if !numeric && !boolean {
            return ColumnKind::Text;
        }
    }

    match (seen, numeric, boolean) {
        (false, _, _) => ColumnKind::Text,
        (true, true, _) => ColumnKind::Numeric,
        (true, false, true) => ColumnKind::Boolean,
        (true, false, false) => ColumnKind::Text,
    }
}

/// Converts a raw field according to its column's kind.
fn typed_field(raw: &str, kind: ColumnKind) -> Cell {
    if is_missing(raw) {
        return Cell::Empty;
    }
    let trimmed = raw.trim();
    match kind {
        ColumnKind::Numeric => match trimmed.parse::<i64>() {
            Ok(value) => Cell::Int(value),
            Err(_) => trimmed
                .parse::<f64>()
                .map(Cell::Float)
                .unwrap_or_else(|_| Cell::Text(raw.to_string())),
        },
        ColumnKind::Boolean => parse_bool(trimmed)
            .map(Cell::Bool)
            .unwrap_or_else(|| Cell::Text(raw.to_string())),
        ColumnKind::Text => Cell::Text(raw.to_string()),
    }
}
