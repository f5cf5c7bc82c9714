//! Error types for the OCR server HTTP surface

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::extract::ExtractionError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// Request body rejected by an extractor before the handler ran
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("File exceeds the {0} byte upload limit")]
    PayloadTooLarge(usize),

    #[error("Extraction timed out after {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Rejected { status, .. } => *status,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Extraction(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Multipart(_) => "invalid_upload",
            AppError::Rejected { .. } => "invalid_request",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::Timeout(_) => "timeout",
            AppError::Extraction(e) => e.kind().as_str(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Extraction failed: {}", self);
        } else {
            tracing::warn!(kind = self.kind(), "Rejected request: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
        });

        (status, body).into_response()
    }
}
