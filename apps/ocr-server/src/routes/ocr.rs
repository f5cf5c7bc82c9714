//! OCR Routes
//!
//! Endpoints:
//! - POST /api/ocr - multipart upload, field `file`
//! - POST /api/ocr/base64 - JSON `{ "file": <base64 or data URL>, "type": "pdf" }`
//! - OPTIONS on both for plain (non-CORS) preflight probes

use axum::{
    extract::{
        rejection::{JsonRejection, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::extract::{ExtractionResult, FileType, SourceDocument};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    // base64 grows the payload by a third
    let encoded_limit = max_upload_bytes
        .saturating_add(max_upload_bytes / 3)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/api/ocr",
            post(upload)
                .options(preflight)
                .layer(DefaultBodyLimit::max(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD))),
        )
        .route(
            "/api/ocr/base64",
            post(upload_base64)
                .options(preflight)
                .layer(DefaultBodyLimit::max(encoded_limit)),
        )
}

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl OcrResponse {
    fn new(result: ExtractionResult, filename: Option<String>) -> Self {
        Self {
            text: result.text,
            length: result.length,
            filename,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Base64Request {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub file_type: String,
}

fn default_type() -> String {
    "pdf".to_string()
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Map an extractor rejection to a JSON error, keeping its status
fn rejected(status: StatusCode, message: String, max_upload_bytes: usize) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(max_upload_bytes)
    } else {
        AppError::Rejected { status, message }
    }
}

/// Extract text from a multipart upload
async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>> {
    let span = tracing::info_span!("ocr_upload", request_id = %Uuid::new_v4());
    upload_inner(state, multipart).instrument(span).await
}

async fn upload_inner(
    state: AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>> {
    let max = state.config().extract.max_upload_bytes;
    let mut multipart = multipart.map_err(|e| rejected(e.status(), e.body_text(), max))?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        // A part without a filename is a form value, not a file
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if field.name() != Some("file") {
            continue;
        }

        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    if filename.is_empty() {
        return Err(AppError::BadRequest("No file selected".to_string()));
    }

    if data.len() > max {
        return Err(AppError::PayloadTooLarge(max));
    }

    // Reject before reading the document
    let file_type = FileType::from_filename(&filename)?;
    tracing::info!(%filename, %file_type, bytes = data.len(), "Received upload");

    let doc = SourceDocument::new(data.to_vec())
        .with_type(file_type)
        .with_filename(filename.clone());
    let result = extract(&state, doc).await?;

    Ok(Json(OcrResponse::new(result, Some(filename))))
}

/// Extract text from a base64 JSON payload
async fn upload_base64(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Base64Request>, JsonRejection>,
) -> Result<Json<OcrResponse>> {
    let span = tracing::info_span!("ocr_base64", request_id = %Uuid::new_v4());
    upload_base64_inner(state, payload).instrument(span).await
}

async fn upload_base64_inner(
    state: AppState,
    payload: std::result::Result<Json<Base64Request>, JsonRejection>,
) -> Result<Json<OcrResponse>> {
    let max = state.config().extract.max_upload_bytes;
    let Json(request) = payload.map_err(|e| rejected(e.status(), e.body_text(), max))?;

    let encoded = request
        .file
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let file_type: FileType = request.file_type.parse()?;

    let data = decode_payload(&encoded)
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 file data: {}", e)))?;

    if data.len() > max {
        return Err(AppError::PayloadTooLarge(max));
    }

    tracing::info!(%file_type, bytes = data.len(), "Received base64 upload");

    let result = extract(&state, SourceDocument::new(data).with_type(file_type)).await?;
    Ok(Json(OcrResponse::new(result, None)))
}

/// Decode plain base64 or the payload part of a data URL
fn decode_payload(file: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let encoded = match file.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => file,
    };
    STANDARD.decode(encoded.trim())
}

/// Run the extractor under the configured deadline
async fn extract(state: &AppState, doc: SourceDocument) -> Result<ExtractionResult> {
    let extraction = state.extractor().extract(doc);

    let result = match state.config().extract.timeout() {
        Some(limit) => tokio::time::timeout(limit, extraction)
            .await
            .map_err(|_| AppError::Timeout(limit.as_secs()))??,
        None => extraction.await?,
    };

    tracing::info!("Extracted {} characters", result.length);
    Ok(result)
}
