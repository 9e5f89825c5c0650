use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single value read from a transaction export.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value. Empty strings and NA markers load as `Empty`.
    Empty,
    /// Plain text.
    Text(String),
    /// Integral number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// Spreadsheet date serial.
    DateTime(f64),
}

impl Cell {
    /// Returns `true` for values a dataframe would treat as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Float(value) | Cell::DateTime(value) => value.is_nan(),
            Cell::Text(value) => value.is_empty(),
            Cell::Int(_) | Cell::Bool(_) => false,
        }
    }

    /// Numeric view of the cell, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(value) => Some(*value as f64),
            Cell::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Text content, if the cell holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Key used for grouping and counting. Equality is exact, with no case or
    /// whitespace normalization.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Ordering used when a summary is sorted by its label: numbers compare
    /// numerically, everything else by its text form.
    pub fn label_cmp(&self, other: &Cell) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(lhs), Some(rhs)) => lhs.total_cmp(&rhs),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.key().cmp(&other.key()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(value) => f.write_str(value),
            Cell::Int(value) => write!(f, "{value}"),
            Cell::Float(value) | Cell::DateTime(value) => write!(f, "{value}"),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// Tabular contents of one loaded file: a header row and data rows.
///
/// Every row holds exactly one cell per column; the fields stay private so
/// that only [`Frame::new`] can build one.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    source: PathBuf,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Creates a frame, padding or cutting rows to the header width.
    pub fn new(source: impl Into<PathBuf>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self {
            source: source.into(),
            columns,
            rows,
        }
    }

    /// Path the frame was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Column names taken from the header row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, each as wide as the header.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Index of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}
