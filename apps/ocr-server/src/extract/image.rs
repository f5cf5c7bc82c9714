//! Image text extraction
//!
//! Runs the OCR engine over one full raster image. No preprocessing, no
//! fallback: engine output is trimmed and returned as-is.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info};

use super::error::ExtractionError;
use super::types::ExtractionResult;
use crate::ocr::OcrEngine;

/// Extractor for raster images and rasterized PDF pages
#[derive(Clone)]
pub struct ImageExtractor {
    engine: Arc<dyn OcrEngine>,
}

impl ImageExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<dyn OcrEngine> {
        &self.engine
    }

    /// OCR an already decoded image
    pub async fn extract_image(&self, image: &DynamicImage) -> Result<ExtractionResult, ExtractionError> {
        debug!(
            engine = self.engine.name(),
            width = image.width(),
            height = image.height(),
            "Running OCR on image"
        );

        let raw = self.engine.recognize(image).await?;
        Ok(ExtractionResult::from_aggregate(&raw))
    }

    /// Decode image bytes, then OCR them
    pub async fn extract_bytes(&self, data: Arc<Vec<u8>>) -> Result<ExtractionResult, ExtractionError> {
        info!(bytes = data.len(), "Extracting text from image");

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&data))
            .await?
            .map_err(|e| ExtractionError::DecodeFailure(e.to_string()))?;

        let result = self.extract_image(&image).await?;
        info!("Extracted {} characters from image", result.length);
        Ok(result)
    }
}
