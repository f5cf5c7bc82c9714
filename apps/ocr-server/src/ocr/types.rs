//! OCR Types

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// The engine binary is missing or cannot be executed
    #[error("OCR engine not available: {0}")]
    EngineUnavailable(String),

    #[error("Failed to encode image for OCR: {0}")]
    ImageEncodingError(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),
}
