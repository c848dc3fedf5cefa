//! ML model inference components

pub mod density;
pub mod inference;
pub mod loader;
pub mod regressor;
pub mod schema;

pub use density::DensityPlot;
pub use inference::{InferenceError, InferenceRunner};
pub use loader::ModelLoader;
pub use regressor::{OnnxRegressor, Regressor};
pub use schema::{FeatureSchema, SchemaMismatch};
