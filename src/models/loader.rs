//! ONNX model loader

use crate::models::regressor::OnnxRegressor;
use crate::models::schema::FeatureSchema;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Sidecar metadata written next to the exported model
#[derive(Debug, Clone, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub model_name: Option<String>,
    /// Training column order
    pub feature_names: Vec<String>,
}

impl ModelMetadata {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read model metadata at {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse model metadata at {}", path.display()))
    }
}

/// Model plus the feature layout it expects
pub struct LoadedModel {
    pub regressor: OnnxRegressor,
    pub schema: FeatureSchema,
}

/// Loader for the ONNX regressor
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Read the feature layout, falling back to the built-in bike schema.
    pub fn load_schema(&self, metadata_path: Option<&Path>) -> Result<(Option<String>, FeatureSchema)> {
        match metadata_path {
            Some(path) if path.exists() => {
                let metadata = ModelMetadata::from_path(path)?;
                if metadata.feature_names.is_empty() {
                    anyhow::bail!("model metadata at {} lists no features", path.display());
                }
                Ok((metadata.model_name, FeatureSchema::new(metadata.feature_names)))
            }
            Some(path) => {
                warn!(path = %path.display(), "Model metadata not found, using built-in feature layout");
                Ok((None, FeatureSchema::default()))
            }
            None => Ok((None, FeatureSchema::default())),
        }
    }

    /// Load the regressor and its schema
    pub fn load<P: AsRef<Path>>(&self, model_path: P, metadata_path: Option<&Path>) -> Result<LoadedModel> {
        let path = model_path.as_ref();
        let (metadata_name, schema) = self.load_schema(metadata_path)?;
        let name = metadata_name.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "regressor".to_string())
        });

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());

        // onnxmltools names the LightGBM regression output "variable"
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("variable") || o.name.contains("output"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            features = schema.len(),
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            regressor: OnnxRegressor::new(name, session, input_name, output_name),
            schema,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}
