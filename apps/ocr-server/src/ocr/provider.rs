//! OCR Engines
//!
//! Defines the engine trait and the Tesseract command-line implementation.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::DynamicImage;
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::types::OcrError;

/// OCR engine trait
///
/// Engines are stateless per call: no handle is kept between two
/// `recognize` invocations, so one engine can serve concurrent requests.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs and health output
    fn name(&self) -> &str;

    /// Check if the engine can be invoked
    async fn is_available(&self) -> bool;

    /// Recognize the text of a full image, returned as the engine produced it
    async fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Tesseract OCR engine driven through its command-line interface
pub struct TesseractEngine {
    /// Resolved binary location
    binary: PathBuf,
    /// Recognition language (e.g. "eng")
    language: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, language: &str) -> Self {
        Self {
            binary: binary.into(),
            language: language.to_string(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn unavailable(&self, e: std::io::Error) -> OcrError {
        OcrError::EngineUnavailable(format!(
            "Tesseract OCR is not installed or not executable at {} ({}). \
             Please install Tesseract-OCR from https://github.com/tesseract-ocr/tesseract",
            self.binary.display(),
            e
        ))
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let image = image.clone();
        // Removed when dropped, on every return path
        let input = tokio::task::spawn_blocking(move || write_png_input(&image))
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Image encoding task failed: {}", e)))??;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    self.unavailable(e)
                }
                _ => OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Encode `image` as PNG into a fresh temp file
///
/// Tesseract is always fed PNG. Encoding a 300 DPI page is CPU-bound, so
/// callers run this on the blocking pool.
fn write_png_input(image: &DynamicImage) -> Result<NamedTempFile, OcrError> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| OcrError::ImageEncodingError(e.to_string()))?;

    let mut input = tempfile::Builder::new()
        .prefix("ocr_input_")
        .suffix(".png")
        .tempfile()
        .map_err(|e| OcrError::ProcessingError(format!("Failed to create temp file: {}", e)))?;
    input
        .write_all(&png)
        .and_then(|_| input.flush())
        .map_err(|e| OcrError::ProcessingError(format!("Failed to write temp file: {}", e)))?;

    Ok(input)
}

/// Mock engine for testing
///
/// Answers with a closure of the image and records the dimensions of every
/// image it was asked to recognize, in call order.
#[cfg(test)]
pub struct MockEngine {
    pub available: bool,
    respond: Box<dyn Fn(&DynamicImage) -> Result<String, OcrError> + Send + Sync>,
    calls: std::sync::Mutex<Vec<(u32, u32)>>,
}

#[cfg(test)]
impl MockEngine {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&DynamicImage) -> Result<String, OcrError> + Send + Sync + 'static,
    {
        Self {
            available: true,
            respond: Box::new(respond),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Engine that always returns the same text
    pub fn returning(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Engine that behaves as if the binary were missing
    pub fn unavailable() -> Self {
        let mut engine = Self::new(|_| Err(OcrError::EngineUnavailable("tesseract not found".into())));
        engine.available = false;
        engine
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl OcrEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        use image::GenericImageView;
        self.calls.lock().unwrap().push(image.dimensions());
        (self.respond)(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn blank_image() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255])))
    }

    #[tokio::test]
    async fn test_missing_binary_is_engine_unavailable() {
        let engine = TesseractEngine::new("/nonexistent/bin/tesseract", "eng");

        assert!(!engine.is_available().await);

        let result = engine.recognize(&blank_image()).await;
        assert!(matches!(result, Err(OcrError::EngineUnavailable(_))));
    }

    #[test]
    fn test_input_file_is_decodable_png() {
        let input = write_png_input(&blank_image()).unwrap();

        let name = input.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("ocr_input_"));
        assert!(name.ends_with(".png"));

        let bytes = std::fs::read(input.path()).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
        assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (8, 8));

        let path = input.path().to_path_buf();
        drop(input);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_mock_engine_records_calls() {
        let engine = MockEngine::returning("text");
        assert_eq!(engine.recognize(&blank_image()).await.unwrap(), "text");
        assert_eq!(engine.calls(), vec![(8, 8)]);
    }
}
