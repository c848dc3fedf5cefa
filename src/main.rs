//! Bike Demand Predictor - Main Entry Point
//!
//! Loads the pretrained regressor and serves the prediction page and API.

use anyhow::{Context, Result};
use bike_demand_predictor::{
    config::{AppConfig, LoggingConfig},
    feature_adapter::FeatureAdapter,
    metrics::{MetricsReporter, PredictionMetrics},
    models::{inference::InferenceRunner, loader::ModelLoader},
    server::{self, AppState},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info")
            .add_directive(format!("bike_demand_predictor={}", logging.level).parse()?)
            .add_directive(format!("tower_http={}", logging.level).parse()?),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Bike Demand Predictor");
    info!(
        "Model: {}, metadata: {}",
        config.model.path,
        config.model.metadata_path.as_deref().unwrap_or("<none>")
    );

    // Load the regressor
    let loader = ModelLoader::with_threads(config.model.onnx_threads)?;
    let loaded = loader.load(
        &config.model.path,
        config.model.metadata_path.as_deref().map(Path::new),
    )?;

    let adapter = FeatureAdapter::new();
    if loaded.schema.names() != adapter.feature_names().as_slice() {
        warn!(
            model = ?loaded.schema.names(),
            form = ?adapter.feature_names(),
            "Model feature names differ from the manual form layout; manual predictions will be rejected"
        );
    }

    let runner = Arc::new(InferenceRunner::new(
        Arc::new(loaded.regressor),
        loaded.schema,
    ));
    info!(
        "Inference runner initialized with model {} ({} features)",
        runner.model_name(),
        runner.schema().len()
    );

    // Initialize metrics
    let metrics = Arc::new(PredictionMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(async move {
            reporter.start().await;
        });
    }

    let state = AppState::new(runner, &config.batch, metrics.clone());
    let app = server::router(state, config.server.max_upload_bytes);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Print final summary
    info!("Server shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
