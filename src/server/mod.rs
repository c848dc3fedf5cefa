//! HTTP surface: the prediction page and its JSON API

pub mod error;
pub mod handlers;
pub mod page;

use crate::config::BatchConfig;
use crate::export::ResultExporter;
use crate::feature_adapter::FeatureAdapter;
use crate::metrics::PredictionMetrics;
use crate::models::inference::InferenceRunner;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<FeatureAdapter>,
    pub runner: Arc<InferenceRunner>,
    pub exporter: Arc<ResultExporter>,
    pub metrics: Arc<PredictionMetrics>,
    /// Name of the appended batch prediction column
    pub prediction_column: Arc<str>,
}

impl AppState {
    pub fn new(
        runner: Arc<InferenceRunner>,
        batch: &BatchConfig,
        metrics: Arc<PredictionMetrics>,
    ) -> Self {
        Self {
            adapter: Arc::new(FeatureAdapter::new()),
            runner,
            exporter: Arc::new(ResultExporter::new(&batch.download_file_name)),
            metrics,
            prediction_column: Arc::from(batch.prediction_column.as_str()),
        }
    }
}

/// Create the router with all routes
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        .route("/upload", post(handlers::upload_form))
        .route("/api/v1/predict", post(handlers::api_predict))
        .route("/api/v1/predict/batch", post(handlers::api_predict_batch))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
