//! Inference runner for bike demand prediction

use crate::models::regressor::Regressor;
use crate::models::schema::{FeatureSchema, SchemaMismatch};
use crate::types::feature_record::FeatureRecord;
use crate::types::table::{Cell, Table, TableError};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Why an inference call produced no predictions
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Input columns do not match the model; the caller's fault
    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),

    #[error("model returned {got} predictions for {expected} rows")]
    OutputLength { expected: usize, got: usize },

    #[error("could not attach predictions: {0}")]
    Table(#[from] TableError),

    #[error("model inference failed: {0:#}")]
    Model(#[source] anyhow::Error),
}

impl InferenceError {
    /// True when the input, not the model, is at fault
    pub fn is_input_error(&self) -> bool {
        matches!(self, InferenceError::SchemaMismatch(_))
    }
}

/// Integer rental estimate: the model output truncated toward zero.
///
/// 7.9 becomes 7 and -2.3 becomes -2. Values beyond the `i64` range saturate
/// and NaN becomes 0.
pub fn truncate_prediction(value: f64) -> i64 {
    value.trunc() as i64
}

/// Runs the injected regressor against tables bound to its schema
pub struct InferenceRunner {
    model: Arc<dyn Regressor>,
    schema: FeatureSchema,
}

impl InferenceRunner {
    pub fn new(model: Arc<dyn Regressor>, schema: FeatureSchema) -> Self {
        Self { model, schema }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Raw model outputs, one per table row, in row order.
    pub fn predict_raw(&self, table: &Table) -> Result<Vec<f64>, InferenceError> {
        let features = self.schema.bind(table)?;
        if features.rows() == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let outputs = self
            .model
            .predict(&features)
            .map_err(InferenceError::Model)?;

        if outputs.len() != features.rows() {
            return Err(InferenceError::OutputLength {
                expected: features.rows(),
                got: outputs.len(),
            });
        }

        debug!(
            model = %self.model.name(),
            rows = features.rows(),
            latency_us = start.elapsed().as_micros() as u64,
            "Inference complete"
        );

        Ok(outputs)
    }

    /// Manual path: one record in, one integer estimate out.
    pub fn predict_record(&self, record: &FeatureRecord) -> Result<i64, InferenceError> {
        let outputs = self.predict_raw(&record.to_table())?;
        match outputs.as_slice() {
            [value] => Ok(truncate_prediction(*value)),
            _ => Err(InferenceError::OutputLength {
                expected: 1,
                got: outputs.len(),
            }),
        }
    }

    /// Batch path: the original table with `column` appended.
    ///
    /// Every original column and the row order are preserved; row `i` of the
    /// new column is the truncated prediction for input row `i`.
    pub fn predict_table(&self, mut table: Table, column: &str) -> Result<Table, InferenceError> {
        let outputs = self.predict_raw(&table)?;
        let cells = outputs
            .into_iter()
            .map(|v| Cell::Int(truncate_prediction(v)))
            .collect();
        table.append_column(column, cells)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::FeatureMatrix;
    use crate::types::feature_record::FEATURE_NAMES;
    use anyhow::Result;

    /// Predicts `hr * 10 + 0.9`, or a fixed value per row when configured
    struct FakeRegressor {
        fixed: Option<Vec<f64>>,
    }

    impl Regressor for FakeRegressor {
        fn name(&self) -> &str {
            "fake"
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
            if let Some(fixed) = &self.fixed {
                return Ok(fixed.clone());
            }
            Ok((0..features.rows())
                .map(|i| features.row(i)[7] as f64 * 10.0 + 0.9)
                .collect())
        }
    }

    fn runner(fixed: Option<Vec<f64>>) -> InferenceRunner {
        InferenceRunner::new(Arc::new(FakeRegressor { fixed }), FeatureSchema::default())
    }

    fn record(hr: u8) -> FeatureRecord {
        FeatureRecord {
            holiday: 0,
            workingday: 1,
            weathersit_clear: 1,
            weathersit_mist: 0,
            weathersit_light_snow: 0,
            weathersit_heavy_rain: 0,
            season: 2,
            hr,
            weekday: 2,
            temp: 0.6,
            atemp: 0.58,
            hum: 0.4,
            windspeed: 0.1,
            day: 1,
            month: 6,
            year: 2012,
        }
    }

    fn batch(hours: &[u8]) -> Table {
        let mut table = Table::new(FEATURE_NAMES.iter().map(|n| n.to_string()).collect());
        for &hr in hours {
            table.push_row(record(hr).cells());
        }
        table
    }

    #[test]
    fn test_truncation_toward_zero() {
        assert_eq!(truncate_prediction(7.9), 7);
        assert_eq!(truncate_prediction(7.0), 7);
        assert_eq!(truncate_prediction(0.99), 0);
        assert_eq!(truncate_prediction(-2.3), -2);
        assert_eq!(truncate_prediction(-0.7), 0);
        assert_eq!(truncate_prediction(f64::NAN), 0);
        assert_eq!(truncate_prediction(1e300), i64::MAX);
    }

    #[test]
    fn test_manual_prediction_is_truncated() {
        let runner = runner(None);
        assert_eq!(runner.predict_record(&record(8)).unwrap(), 80);
        assert_eq!(runner.model_name(), "fake");
    }

    #[test]
    fn test_batch_appends_column_in_row_order() {
        let runner = runner(None);
        let input = batch(&[3, 17, 0]);

        let output = runner
            .predict_table(input.clone(), "Predicted_Bike_Rentals")
            .unwrap();

        assert_eq!(output.row_count(), 3);
        assert_eq!(output.columns().len(), input.columns().len() + 1);
        assert_eq!(&output.columns()[..16], input.columns());
        assert_eq!(output.columns()[16], "Predicted_Bike_Rentals");
        for (i, row) in output.rows().iter().enumerate() {
            assert_eq!(&row[..16], input.rows()[i].as_slice());
        }
        let predicted: Vec<&Cell> = output.rows().iter().map(|r| &r[16]).collect();
        assert_eq!(predicted, vec![&Cell::Int(30), &Cell::Int(170), &Cell::Int(0)]);
    }

    #[test]
    fn test_batch_binding_ignores_column_order() {
        let runner = runner(None);
        let input = batch(&[5, 6]);

        // Same data with columns reversed
        let mut columns = input.columns().to_vec();
        columns.reverse();
        let mut reversed = Table::new(columns);
        for row in input.rows() {
            let mut row = row.clone();
            row.reverse();
            reversed.push_row(row);
        }

        let a = runner.predict_raw(&input).unwrap();
        let b = runner.predict_raw(&reversed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let runner = runner(None);
        let full = batch(&[1]);
        let mut partial = Table::new(full.columns()[1..].to_vec());
        partial.push_row(full.rows()[0][1..].to_vec());

        let err = runner.predict_table(partial, "Predicted_Bike_Rentals").unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("missing [holiday]"));
    }

    #[test]
    fn test_wrong_output_length() {
        let runner = runner(Some(vec![1.0]));
        let err = runner.predict_raw(&batch(&[1, 2])).unwrap_err();
        assert!(matches!(err, InferenceError::OutputLength { expected: 2, got: 1 }));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_header_only_batch() {
        let runner = runner(Some(vec![]));
        let output = runner.predict_table(batch(&[]), "pred").unwrap();
        assert_eq!(output.row_count(), 0);
        assert_eq!(output.columns().last().map(String::as_str), Some("pred"));
    }
}
