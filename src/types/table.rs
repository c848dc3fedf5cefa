//! In-memory table of named columns, as parsed from an upload

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised while building or reading a table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("unsupported file type {0:?}; upload a .csv or .xlsx file")]
    UnsupportedFormat(String),

    #[error("uploaded file is empty")]
    EmptyFile,

    #[error("could not read uploaded file: {0}")]
    Unreadable(String),

    #[error("column {column:?} has {found} values but the table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column {0:?} already exists")]
    DuplicateColumn(String),
}

/// A single table value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Empty,
}

impl Cell {
    /// Infer a typed cell from delimited text.
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        if value.is_empty() {
            return Cell::Empty;
        }
        if let Ok(v) = value.parse::<i64>() {
            return Cell::Int(v);
        }
        if let Ok(v) = value.parse::<f64>() {
            return Cell::Float(v);
        }
        match value {
            "True" | "true" | "TRUE" => Cell::Bool(true),
            "False" | "false" | "FALSE" => Cell::Bool(false),
            _ => Cell::Text(value.to_string()),
        }
    }

    /// Numeric model input for this cell.
    ///
    /// Booleans map to 1/0 and empty cells to NaN (a missing value).
    /// Text has no numeric meaning and yields `None`.
    pub fn as_feature(&self) -> Option<f32> {
        match self {
            Cell::Int(v) => Some(*v as f32),
            Cell::Float(v) => Some(*v as f32),
            Cell::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Cell::Empty => Some(f32::NAN),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Float(v) if v.is_nan() => Ok(()),
            // keep a trailing ".0" so float columns stay float columns on re-import
            Cell::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => write!(f, "{:.1}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Text(v) => f.write_str(v),
            Cell::Empty => Ok(()),
        }
    }
}

/// Rows of typed cells under an ordered header
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The row must have one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a column after all existing ones, one value per row.
    pub fn append_column(&mut self, name: &str, values: Vec<Cell>) -> Result<(), TableError> {
        if self.column_index(name).is_some() {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.rows.len() {
            return Err(TableError::ColumnLength {
                column: name.to_string(),
                expected: self.rows.len(),
                found: values.len(),
            });
        }

        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Convert integral float columns to integer columns.
    ///
    /// Spreadsheets store every number as a float; a column whose non-empty
    /// values are all whole numbers is read back as integers.
    pub fn normalize_integral_columns(&mut self) {
        for col in 0..self.columns.len() {
            let mut has_float = false;
            let integral = self.rows.iter().all(|row| match &row[col] {
                Cell::Float(v) => {
                    has_float = true;
                    v.fract() == 0.0 && v.abs() < 9.0e15
                }
                Cell::Int(_) | Cell::Empty => true,
                _ => false,
            });
            let has_empty = self.rows.iter().any(|row| row[col] == Cell::Empty);

            if has_float && integral && !has_empty {
                for row in &mut self.rows {
                    if let Cell::Float(v) = row[col] {
                        row[col] = Cell::Int(v as i64);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse("12"), Cell::Int(12));
        assert_eq!(Cell::parse(" 0.25 "), Cell::Float(0.25));
        assert_eq!(Cell::parse("True"), Cell::Bool(true));
        assert_eq!(Cell::parse("false"), Cell::Bool(false));
        assert_eq!(Cell::parse(""), Cell::Empty);
        assert_eq!(Cell::parse("Clear"), Cell::Text("Clear".to_string()));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Int(-3).to_string(), "-3");
        assert_eq!(Cell::Float(1.0).to_string(), "1.0");
        assert_eq!(Cell::Float(0.24).to_string(), "0.24");
        assert_eq!(Cell::Float(f64::NAN).to_string(), "");
        assert_eq!(Cell::Bool(true).to_string(), "True");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn test_cell_as_feature() {
        assert_eq!(Cell::Int(4).as_feature(), Some(4.0));
        assert_eq!(Cell::Bool(true).as_feature(), Some(1.0));
        assert!(Cell::Empty.as_feature().unwrap().is_nan());
        assert_eq!(Cell::Text("x".into()).as_feature(), None);
    }

    #[test]
    fn test_append_column() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![Cell::Int(1), Cell::Int(2)]);
        table.push_row(vec![Cell::Int(3), Cell::Int(4)]);

        table
            .append_column("c", vec![Cell::Int(10), Cell::Int(20)])
            .unwrap();
        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.rows()[1], vec![Cell::Int(3), Cell::Int(4), Cell::Int(20)]);

        assert!(matches!(
            table.append_column("d", vec![Cell::Int(1)]),
            Err(TableError::ColumnLength { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            table.append_column("a", vec![Cell::Int(1), Cell::Int(2)]),
            Err(TableError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_normalize_integral_columns() {
        let mut table = Table::new(vec!["hr".into(), "temp".into()]);
        table.push_row(vec![Cell::Float(7.0), Cell::Float(0.5)]);
        table.push_row(vec![Cell::Float(8.0), Cell::Float(1.0)]);
        table.normalize_integral_columns();

        assert_eq!(table.rows()[0][0], Cell::Int(7));
        assert_eq!(table.rows()[1][1], Cell::Float(1.0));
    }
}
