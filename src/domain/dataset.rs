// ============================================================
// TABULAR DATASET TYPES
// ============================================================
// In-memory representation of one worksheet: header row + rows

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::domain::error::CompareError;

/// A single spreadsheet cell, carried through a run unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Build a cell from raw text, mapping blank strings to `Empty`
    pub fn from_text(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form of the cell, as a spreadsheet would display it without formatting
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(i) => write!(f, "{}", i),
            // Whole floats print without a fractional part, the way Excel shows them
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A data row (header excluded)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Position in the source sheet, counted from sheet row 2 (0-based)
    pub index: usize,

    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn new(index: usize, cells: Vec<CellValue>) -> Self {
        Self { index, cells }
    }

    /// Cell at `column`; short rows read as empty
    pub fn get(&self, column: usize) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    /// Overwrite the cell at `column`, padding short rows
    pub fn set(&mut self, column: usize, value: CellValue) {
        if self.cells.len() <= column {
            self.cells.resize(column + 1, CellValue::Empty);
        }
        self.cells[column] = value;
    }

    /// Row number as shown in a spreadsheet (header is row 1)
    pub fn sheet_row_number(&self) -> usize {
        self.index + 2
    }
}

/// One loaded worksheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(source: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first header equal to `name` (exact, case-sensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, CompareError> {
        self.column_index(name)
            .ok_or_else(|| CompareError::MissingColumn {
                path: self.source.clone(),
                column: name.to_string(),
            })
    }
}
