//! Regression model handle

use crate::models::schema::FeatureMatrix;
use anyhow::{anyhow, Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// A pretrained regressor: one real-valued prediction per matrix row.
///
/// Implementations are read-only after construction and shared across
/// requests.
pub trait Regressor: Send + Sync {
    /// Model name for logs and status output
    fn name(&self) -> &str;

    /// Predict one value per row of `features`, in row order.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;
}

/// Gradient-boosted regressor exported to ONNX
pub struct OnnxRegressor {
    name: String,
    /// ONNX Runtime needs exclusive access to run a session
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxRegressor {
    pub fn new(name: String, session: Session, input_name: String, output_name: String) -> Self {
        Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
        }
    }
}

impl Regressor for OnnxRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        // Prepare input tensor - shape [rows, num_features]
        let shape = vec![features.rows() as i64, features.cols() as i64];
        let input_tensor = Tensor::from_array((shape, features.values().to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        // Prefer the configured output, then any float tensor output
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                debug!(model = %self.name, rows = data.len(), "Extracted regression output");
                return Ok(data.iter().map(|&v| v as f64).collect());
            }
        }

        for (name, output) in outputs.iter() {
            if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
                debug!(model = %self.name, output = %name, "Extracted regression output (fallback)");
                return Ok(data.iter().map(|&v| v as f64).collect());
            }
        }

        Err(anyhow!(
            "model {} produced no float tensor output",
            self.name
        ))
    }
}
