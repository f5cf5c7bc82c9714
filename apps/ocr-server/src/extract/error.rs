//! Extraction error types
//!
//! The fixed failure vocabulary shared by every extractor and the dispatcher.

use serde::Serialize;
use thiserror::Error;

use crate::ocr::OcrError;

/// Extraction failure
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The declared or inferred type is not one of pdf, docx or image
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// The input file does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// The OCR backend cannot be invoked at all
    #[error("{0}")]
    EngineUnavailable(String),

    /// The input bytes are not a decodable raster image
    #[error("Failed to decode image: {0}")]
    DecodeFailure(String),

    /// The extractor ran and failed
    #[error("{0}")]
    ExtractionFailure(String),
}

/// Fieldless mirror of [`ExtractionError`] for matching and serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedType,
    NotFound,
    EngineUnavailable,
    DecodeFailure,
    ExtractionFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "unsupported_type",
            Self::NotFound => "not_found",
            Self::EngineUnavailable => "engine_unavailable",
            Self::DecodeFailure => "decode_failure",
            Self::ExtractionFailure => "extraction_failure",
        }
    }
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::EngineUnavailable(_) => ErrorKind::EngineUnavailable,
            Self::DecodeFailure(_) => ErrorKind::DecodeFailure,
            Self::ExtractionFailure(_) => ErrorKind::ExtractionFailure,
        }
    }

    /// Whether the failure is caused by the caller's input rather than by extraction
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedType(_) | Self::NotFound(_))
    }

    /// Prefix the message with the extractor context, keeping the kind
    pub(crate) fn context(self, context: &str) -> Self {
        match self {
            Self::ExtractionFailure(msg) => Self::ExtractionFailure(format!("{}: {}", context, msg)),
            other => other,
        }
    }
}

impl From<OcrError> for ExtractionError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::EngineUnavailable(_) => ExtractionError::EngineUnavailable(err.to_string()),
            OcrError::ProcessingError(_) | OcrError::ImageEncodingError(_) => {
                ExtractionError::ExtractionFailure(format!("Failed to perform OCR on image: {}", err))
            }
        }
    }
}

impl From<tokio::task::JoinError> for ExtractionError {
    fn from(err: tokio::task::JoinError) -> Self {
        ExtractionError::ExtractionFailure(format!("Extraction task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_unavailable_is_not_extraction_failure() {
        let err: ExtractionError = OcrError::EngineUnavailable("tesseract".into()).into();
        assert_eq!(err.kind(), ErrorKind::EngineUnavailable);

        let err: ExtractionError = OcrError::ProcessingError("bad image".into()).into();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
        assert!(err.to_string().contains("bad image"));
    }

    #[test]
    fn test_context_only_wraps_failures() {
        let err = ExtractionError::ExtractionFailure("boom".into()).context("Failed to extract text from PDF");
        assert_eq!(err.to_string(), "Failed to extract text from PDF: boom");

        let err = ExtractionError::EngineUnavailable("missing".into()).context("ignored");
        assert_eq!(err.to_string(), "missing");
    }

    #[test]
    fn test_client_errors() {
        assert!(ExtractionError::UnsupportedType("txt".into()).is_client_error());
        assert!(ExtractionError::NotFound("/tmp/x".into()).is_client_error());
        assert!(!ExtractionError::ExtractionFailure("x".into()).is_client_error());
        assert!(!ExtractionError::DecodeFailure("x".into()).is_client_error());
    }
}
