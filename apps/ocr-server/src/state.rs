//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::extract::DocumentExtractor;
use crate::mupdf::MupdfBackend;
use crate::ocr::{locate_tesseract, OcrEngine, TesseractEngine, DEFAULT_TESSERACT_PATHS};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub extractor: DocumentExtractor,
}

impl AppState {
    pub fn new(config: Config, extractor: DocumentExtractor) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, extractor }),
        }
    }

    /// Wire the Tesseract engine and MuPDF backend from configuration
    pub fn from_config(config: Config) -> Self {
        let extractor = build_extractor(&config);
        Self::new(config, extractor)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document extractor
    pub fn extractor(&self) -> &DocumentExtractor {
        &self.inner.extractor
    }
}

/// Build the production extractor: Tesseract for OCR, MuPDF for PDFs
///
/// The Tesseract binary is resolved here, once per process.
pub fn build_extractor(config: &Config) -> DocumentExtractor {
    let binary = locate_tesseract(config.ocr.tesseract_cmd.as_deref(), DEFAULT_TESSERACT_PATHS);
    tracing::info!("Using Tesseract at {}", binary.display());

    let engine: Arc<dyn OcrEngine> = Arc::new(TesseractEngine::new(binary, &config.ocr.language));
    DocumentExtractor::new(engine, Arc::new(MupdfBackend), config.extract_options())
}
