//! The issue metadata sheet.
//!
//! Editors keep one row per issue in a spreadsheet-like table. Row 0 is a
//! header; every later row is data. Columns are positional:
//!
//! | Column | Meaning |
//! |--------|---------|
//! | 0 | title (join key, matches the PDF file stem) |
//! | 1 | description (headline) |
//! | 2 | date (a real date or free text) |
//! | 3 | category (optional) |
//! | 4 | featured flag, the literal text `TRUE` (optional) |
//!
//! The reader does not validate the header or the column contents; it hands
//! raw [`Cell`]s to the reconciler.
//!
//! ## TOML sheets
//!
//! [`TomlSheet`] reads a TOML document holding one or more named sheets.
//! TOML's native dates make the date-or-text distinction explicit:
//!
//! ```toml
//! [sheets.Sheet1]
//! rows = [
//!   ["Issue Name", "Description", "Date", "Category", "Featured"],
//!   ["newspaper-issue-1", "Welcome back!", 2024-09-05, "News", "TRUE"],
//!   ["newspaper-issue-2", "Homecoming", "October 2024"],
//! ]
//! ```
//!
//! Short rows are padded with [`Cell::Empty`] when a column is read.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TITLE: usize = 0;
pub const DESCRIPTION: usize = 1;
pub const DATE: usize = 2;
pub const CATEGORY: usize = 3;
pub const FEATURED: usize = 4;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Sheet '{0}' not found")]
    MissingSheet(String),
    #[error("Malformed sheet: {0}")]
    Malformed(String),
}

/// One raw cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(toml::value::Datetime),
}

impl Cell {
    /// Convert a TOML value into a cell. Arrays and tables are kept as text.
    pub fn from_toml(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Cell::Text(s.clone()),
            toml::Value::Integer(i) => Cell::Number(*i as f64),
            toml::Value::Float(f) => Cell::Number(*f),
            toml::Value::Boolean(b) => Cell::Bool(*b),
            toml::Value::Datetime(dt) => Cell::Date(*dt),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Whether the cell counts as "not filled in": empty, `""`, `0`, or `false`.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(n) => *n == 0.0 || n.is_nan(),
            Cell::Bool(b) => !b,
            Cell::Date(_) => false,
        }
    }

    /// Textual form of the cell, as a spreadsheet would display it raw.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(dt) => dt.to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

static EMPTY: Cell = Cell::Empty;

/// Read a cell by column, treating missing columns as empty.
pub fn cell(row: &[Cell], column: usize) -> &Cell {
    row.get(column).unwrap_or(&EMPTY)
}

/// A tabular source of issue rows.
pub trait SheetSource {
    /// All rows, header included.
    fn rows(&self) -> Result<Vec<Vec<Cell>>, SheetError>;
}

/// A named sheet inside a TOML file.
#[derive(Debug, Clone)]
pub struct TomlSheet {
    path: PathBuf,
    sheet_name: String,
}

impl TomlSheet {
    pub fn new(path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet_name: sheet_name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetSource for TomlSheet {
    fn rows(&self) -> Result<Vec<Vec<Cell>>, SheetError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SheetError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_sheet(&content, &self.sheet_name)
    }
}

/// Parse the rows of `sheet_name` out of a TOML sheet document.
pub fn parse_sheet(content: &str, sheet_name: &str) -> Result<Vec<Vec<Cell>>, SheetError> {
    let doc: toml::Value = toml::from_str(content)?;
    let sheet = doc
        .get("sheets")
        .and_then(|s| s.get(sheet_name))
        .ok_or_else(|| SheetError::MissingSheet(sheet_name.to_string()))?;

    let rows = match sheet.get("rows") {
        Some(toml::Value::Array(rows)) => rows,
        Some(_) => return Err(SheetError::Malformed("`rows` must be an array".into())),
        None => return Ok(Vec::new()),
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| match row {
            toml::Value::Array(cells) => Ok(cells.iter().map(Cell::from_toml).collect()),
            _ => Err(SheetError::Malformed(format!("row {i} is not an array"))),
        })
        .collect()
}

/// Read every row from a source, header included.
pub fn read_rows(source: &dyn SheetSource) -> Result<Vec<Vec<Cell>>, SheetError> {
    source.rows()
}
