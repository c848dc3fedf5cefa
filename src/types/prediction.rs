//! Manual-mode prediction result

use crate::models::density::DensityPlot;
use crate::types::feature_record::FeatureRecord;
use serde::Serialize;

/// Outcome of a single manual prediction
#[derive(Debug, Clone, Serialize)]
pub struct ManualPrediction {
    /// Estimated rentals, truncated toward zero
    pub prediction: i64,
    /// The record the model was fed
    pub model_input: FeatureRecord,
    /// Perturbation band and KDE curve for the plot
    pub density: DensityPlot,
}

impl ManualPrediction {
    pub fn new(model_input: FeatureRecord, prediction: i64) -> Self {
        Self {
            prediction,
            model_input,
            density: DensityPlot::for_prediction(prediction),
        }
    }
}
