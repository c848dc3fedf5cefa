//! Request handlers for the page and the JSON API

use super::page::{self, Mode};
use super::{AppError, AppResult, AppState};
use crate::batch::{self, BatchOutcome};
use crate::feature_adapter::ManualInput;
use crate::types::prediction::ManualPrediction;
use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    #[serde(default)]
    pub mode: Mode,
}

/// An uploaded file as received from the `file` field
struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> AppResult<Option<UploadedFile>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some(UploadedFile {
            name,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

async fn predict_manual(state: &AppState, input: &ManualInput) -> AppResult<ManualPrediction> {
    let record = state.adapter.from_manual(input)?;
    let runner = state.runner.clone();

    let (prediction, elapsed) = tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        runner
            .predict_record(&record)
            .map(|prediction| (ManualPrediction::new(record, prediction), start.elapsed()))
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Inference task failed: {}", e)))??;
    state.metrics.record_manual(elapsed, prediction.prediction);

    debug!(
        prediction = prediction.prediction,
        hr = prediction.model_input.hr,
        weather = %input.weather,
        "Manual prediction"
    );
    Ok(prediction)
}

/// Error banner plus the status the page is served with
fn error_content(err: &AppError) -> (StatusCode, String) {
    err.log();
    (err.status_code(), page::error_banner(err.title(), err.detail()))
}

async fn run_batch(state: &AppState, file: UploadedFile) -> AppResult<BatchOutcome> {
    let adapter = state.adapter.clone();
    let runner = state.runner.clone();
    let column = state.prediction_column.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        batch::process_upload(&adapter, &runner, &file.name, &file.bytes, &column)
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Batch task failed: {}", e)))??;

    match &outcome {
        BatchOutcome::Completed(result) => {
            state.metrics.record_batch(result.elapsed, &result.predictions);
        }
        BatchOutcome::Rejected(_) => state.metrics.record_rejection(),
    }
    Ok(outcome)
}

/// GET / renders the page in the requested input mode
pub async fn index(Query(query): Query<IndexQuery>) -> Html<String> {
    match query.mode {
        Mode::Manual => Html(page::manual_page(&ManualInput::default(), "")),
        Mode::Upload => Html(page::upload_page("")),
    }
}

/// POST /predict handles the manual form
pub async fn predict_form(
    State(state): State<AppState>,
    Form(input): Form<ManualInput>,
) -> (StatusCode, Html<String>) {
    match predict_manual(&state, &input).await {
        Ok(prediction) => (
            StatusCode::OK,
            Html(page::manual_page(&input, &page::prediction_section(&prediction))),
        ),
        Err(e) => {
            warn!(error = %e, "Manual prediction failed");
            let (status, banner) = error_content(&e);
            (status, Html(page::manual_page(&input, &banner)))
        }
    }
}

/// POST /upload scores an uploaded file and renders the result
pub async fn upload_form(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    match upload_content(&state, multipart).await {
        Ok(content) => (StatusCode::OK, Html(page::upload_page(&content))),
        Err(e) => {
            let (status, banner) = error_content(&e);
            (status, Html(page::upload_page(&banner)))
        }
    }
}

async fn upload_content(state: &AppState, multipart: Multipart) -> AppResult<String> {
    let file = read_upload(multipart)
        .await?
        .ok_or_else(|| AppError::InvalidInput("No file uploaded".to_string()))?;

    let file_name = file.name.clone();
    let content = match run_batch(state, file).await? {
        BatchOutcome::Completed(result) => {
            let csv = state.exporter.to_csv(&result.predicted)?;
            info!(file = %file_name, rows = result.predictions.len(), "Upload scored");
            format!(
                "<h3>📄 Uploaded Data</h3>{}{}<h3>📈 Prediction Results</h3>{}{}",
                page::table_html(&result.uploaded),
                page::success_banner("✅ Prediction Completed"),
                page::table_html(&result.predicted),
                page::download_link(&csv, state.exporter.file_name())
            )
        }
        BatchOutcome::Rejected(rejection) => {
            let uploaded = rejection
                .uploaded
                .as_ref()
                .map(|t| format!("<h3>📄 Uploaded Data</h3>{}", page::table_html(t)))
                .unwrap_or_default();
            format!(
                "{}{}",
                uploaded,
                page::error_banner(
                    "❌ File format does not match model input",
                    Some(&rejection.reason)
                )
            )
        }
    };
    Ok(content)
}

/// POST /api/v1/predict
pub async fn api_predict(
    State(state): State<AppState>,
    Json(input): Json<ManualInput>,
) -> AppResult<Json<ManualPrediction>> {
    Ok(Json(predict_manual(&state, &input).await?))
}

/// POST /api/v1/predict/batch
pub async fn api_predict_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Response> {
    let file = read_upload(multipart)
        .await?
        .ok_or_else(|| AppError::InvalidInput("missing multipart field \"file\"".to_string()))?;

    match run_batch(&state, file).await? {
        BatchOutcome::Completed(result) => {
            let csv = state.exporter.to_csv(&result.predicted)?;
            Ok((
                [
                    (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
                    (header::CONTENT_DISPOSITION, state.exporter.content_disposition()),
                ],
                csv,
            )
                .into_response())
        }
        BatchOutcome::Rejected(rejection) => Err(AppError::UnprocessableUpload(rejection.reason)),
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.runner.model_name(),
        "features": state.runner.schema().names(),
        "metrics": state.metrics.snapshot(),
    }))
}
