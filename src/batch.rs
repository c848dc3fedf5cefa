//! Batch upload processing
//!
//! An upload either completes with a result table or is rejected with a
//! reason the user can act on. Only failures of the model itself escape as
//! errors.

use crate::feature_adapter::FeatureAdapter;
use crate::models::inference::{InferenceError, InferenceRunner};
use crate::types::table::{Cell, Table};
use crate::upload;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Predictions attached to an upload
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// The table as uploaded
    pub uploaded: Table,
    /// The uploaded table plus the prediction column
    pub predicted: Table,
    /// Prediction column values, in row order
    pub predictions: Vec<i64>,
    pub elapsed: Duration,
}

/// An upload that could not be scored
#[derive(Debug, Clone)]
pub struct BatchRejection {
    /// Present when the file parsed but did not match the model
    pub uploaded: Option<Table>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Completed(BatchResult),
    Rejected(BatchRejection),
}

/// Parse an uploaded file and score every row.
pub fn process_upload(
    adapter: &FeatureAdapter,
    runner: &InferenceRunner,
    file_name: &str,
    bytes: &[u8],
    column: &str,
) -> Result<BatchOutcome, InferenceError> {
    let table = match upload::read_table(file_name, bytes) {
        Ok(table) => adapter.from_table(table),
        Err(e) => {
            warn!(file = %file_name, error = %e, "Upload could not be read");
            return Ok(BatchOutcome::Rejected(BatchRejection {
                uploaded: None,
                reason: e.to_string(),
            }));
        }
    };

    let uploaded = table.clone();
    let start = Instant::now();
    match runner.predict_table(table, column) {
        Ok(predicted) => {
            let elapsed = start.elapsed();
            let predictions: Vec<i64> = predicted
                .rows()
                .iter()
                .filter_map(|row| match row.last() {
                    Some(Cell::Int(v)) => Some(*v),
                    _ => None,
                })
                .collect();

            info!(
                file = %file_name,
                rows = predictions.len(),
                elapsed_us = elapsed.as_micros() as u64,
                "Batch prediction completed"
            );

            Ok(BatchOutcome::Completed(BatchResult {
                uploaded,
                predicted,
                predictions,
                elapsed,
            }))
        }
        Err(e) if e.is_input_error() => {
            warn!(file = %file_name, error = %e, "Upload does not match model input");
            Ok(BatchOutcome::Rejected(BatchRejection {
                uploaded: Some(uploaded),
                reason: e.to_string(),
            }))
        }
        Err(e) => Err(e),
    }
}
