//! Bike Demand Predictor Library
//!
//! Estimates hourly bike rentals from weather and calendar features with a
//! pretrained gradient-boosted regressor, one record at a time from a form or
//! in bulk from an uploaded CSV/Excel table.

pub mod batch;
pub mod config;
pub mod export;
pub mod feature_adapter;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;
pub mod upload;

pub use batch::{BatchOutcome, BatchRejection, BatchResult};
pub use config::AppConfig;
pub use export::ResultExporter;
pub use feature_adapter::{FeatureAdapter, ManualInput};
pub use models::inference::InferenceRunner;
pub use types::{FeatureRecord, ManualPrediction, Table};
