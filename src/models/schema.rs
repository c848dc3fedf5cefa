//! Name-based binding of tables to the model's feature layout

use crate::types::feature_record::FEATURE_NAMES;
use crate::types::table::Table;
use std::collections::HashSet;
use thiserror::Error;

/// The uploaded columns do not line up with what the model was trained on
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaMismatch {
    #[error("feature names mismatch: {}", describe_columns(missing, unexpected))]
    Columns {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("column {0:?} appears more than once")]
    DuplicateColumn(String),

    /// `row` is the 1-based data row, header excluded
    #[error("column {column:?} must be numeric or boolean, found {value:?} in row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
}

fn describe_columns(missing: &[String], unexpected: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing [{}]", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!("unexpected [{}]", unexpected.join(", ")));
    }
    parts.join("; ")
}

/// Row-major `f32` matrix with columns in model order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl FeatureMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.cols..(index + 1) * self.cols]
    }
}

/// Ordered feature names the model expects
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bind a table to this schema by column name.
    ///
    /// The table must carry exactly the schema's columns, in any order, with
    /// numeric, boolean or empty cells. The result is laid out in schema order.
    pub fn bind(&self, table: &Table) -> Result<FeatureMatrix, SchemaMismatch> {
        let mut seen = HashSet::new();
        for column in table.columns() {
            if !seen.insert(column.as_str()) {
                return Err(SchemaMismatch::DuplicateColumn(column.clone()));
            }
        }

        let missing: Vec<String> = self
            .names
            .iter()
            .filter(|name| !seen.contains(name.as_str()))
            .cloned()
            .collect();
        let unexpected: Vec<String> = table
            .columns()
            .iter()
            .filter(|column| !self.names.contains(column))
            .cloned()
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(SchemaMismatch::Columns {
                missing,
                unexpected,
            });
        }

        let positions: Vec<usize> = self
            .names
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect();

        let mut values = Vec::with_capacity(table.row_count() * self.names.len());
        for (row_index, row) in table.rows().iter().enumerate() {
            for &position in &positions {
                let cell = &row[position];
                let value = cell.as_feature().ok_or_else(|| SchemaMismatch::NonNumeric {
                    column: table.columns()[position].clone(),
                    row: row_index + 1,
                    value: cell.to_string(),
                })?;
                values.push(value);
            }
        }

        Ok(FeatureMatrix {
            rows: table.row_count(),
            cols: self.names.len(),
            values,
        })
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(FEATURE_NAMES.iter().map(|n| n.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::table::Cell;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["hr".into(), "temp".into(), "holiday".into()])
    }

    #[test]
    fn test_bind_reorders_by_name() {
        let mut table = Table::new(vec!["temp".into(), "holiday".into(), "hr".into()]);
        table.push_row(vec![Cell::Float(0.5), Cell::Bool(true), Cell::Int(8)]);
        table.push_row(vec![Cell::Empty, Cell::Int(0), Cell::Int(9)]);

        let matrix = schema().bind(&table).unwrap();
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), 3);
        assert_eq!(matrix.row(0), &[8.0, 0.5, 1.0]);
        assert_eq!(matrix.row(1)[0], 9.0);
        assert!(matrix.row(1)[1].is_nan());
    }

    #[test]
    fn test_missing_and_unexpected_columns() {
        let mut table = Table::new(vec!["hr".into(), "temperature".into()]);
        table.push_row(vec![Cell::Int(1), Cell::Float(0.1)]);

        let err = schema().bind(&table).unwrap_err();
        assert_eq!(
            err,
            SchemaMismatch::Columns {
                missing: vec!["temp".into(), "holiday".into()],
                unexpected: vec!["temperature".into()],
            }
        );
        assert_eq!(
            err.to_string(),
            "feature names mismatch: missing [temp, holiday]; unexpected [temperature]"
        );
    }

    #[test]
    fn test_text_cell_is_type_mismatch() {
        let mut table = Table::new(vec!["hr".into(), "temp".into(), "holiday".into()]);
        table.push_row(vec![Cell::Int(1), Cell::Float(0.1), Cell::Int(0)]);
        table.push_row(vec![Cell::Int(2), Cell::Text("warm".into()), Cell::Int(0)]);

        let err = schema().bind(&table).unwrap_err();
        assert_eq!(
            err,
            SchemaMismatch::NonNumeric {
                column: "temp".into(),
                row: 2,
                value: "warm".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_column() {
        let table = Table::new(vec!["hr".into(), "hr".into(), "temp".into()]);
        assert_eq!(
            schema().bind(&table),
            Err(SchemaMismatch::DuplicateColumn("hr".into()))
        );
    }

    #[test]
    fn test_header_only_table_binds() {
        let table = Table::new(vec!["holiday".into(), "hr".into(), "temp".into()]);
        let matrix = schema().bind(&table).unwrap();
        assert_eq!(matrix.rows(), 0);
        assert!(matrix.values().is_empty());
    }

    #[test]
    fn test_default_schema_has_sixteen_features() {
        assert_eq!(FeatureSchema::default().len(), 16);
    }
}
