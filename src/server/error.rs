//! Error handling for the HTTP surface

use crate::feature_adapter::AdapterError;
use crate::models::inference::InferenceError;
use crate::types::table::TableError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Manual input outside its domain, or a malformed request
    #[error("{0}")]
    InvalidInput(String),

    /// Uploaded file unreadable or not matching the model input
    #[error("{0}")]
    UnprocessableUpload(String),

    #[error("{0}")]
    InternalError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UnprocessableUpload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short heading shown to the user
    pub fn title(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "Invalid input",
            AppError::UnprocessableUpload(_) => "File format does not match model input",
            AppError::InternalError(_) => "Internal server error",
        }
    }

    /// User-facing detail; internal errors only go to the log
    pub fn detail(&self) -> Option<&str> {
        match self {
            AppError::InvalidInput(msg) | AppError::UnprocessableUpload(msg) => Some(msg),
            AppError::InternalError(_) => None,
        }
    }

    /// Log server-side failures
    pub fn log(&self) {
        if let AppError::InternalError(msg) = self {
            tracing::error!("Internal error: {}", msg);
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = Json(json!({
            "error": self.title(),
            "detail": self.detail().unwrap_or_default(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<AdapterError> for AppError {
    fn from(err: AdapterError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<TableError> for AppError {
    fn from(err: TableError) -> Self {
        AppError::UnprocessableUpload(err.to_string())
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        if err.is_input_error() {
            AppError::UnprocessableUpload(err.to_string())
        } else {
            AppError::InternalError(err.to_string())
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(format!("{:#}", err))
    }
}
