//! PDF text extraction
//!
//! Two phases, decided per document:
//!
//! 1. **Direct text**: the embedded text layer of every page, in order.
//!    Any non-blank result is returned and OCR is never attempted.
//! 2. **OCR fallback**: entered when phase 1 yields only whitespace or
//!    cannot read the file. Every page is rasterized at [`RASTER_DPI`] and
//!    run through the image extractor; per-page text is joined in page order.
//!
//! The PDF backend sits behind [`TextLayerReader`] and [`PageRasterizer`] so
//! the decision procedure can be exercised without a real renderer.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use image::DynamicImage;
use thiserror::Error;
use tracing::{info, warn};

use super::error::ExtractionError;
use super::image::ImageExtractor;
use super::types::ExtractionResult;

/// Rasterization resolution for the OCR phase
pub const RASTER_DPI: u32 = 300;

/// Default number of pages recognized at once
pub const DEFAULT_PAGE_CONCURRENCY: usize = 2;

/// PDF backend errors
#[derive(Debug, Error)]
pub enum PdfBackendError {
    #[error("Failed to open PDF: {0}")]
    Open(String),

    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),

    #[error("Failed to render page {0}: {1}")]
    Render(usize, String),

    #[error("PDF backend error: {0}")]
    Backend(String),
}

/// Reads the embedded text layer of a PDF
///
/// Implementations are blocking and are called from a blocking task.
pub trait TextLayerReader: Send + Sync {
    /// Text layer of every page in document order, possibly empty per page
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>, PdfBackendError>;
}

/// Renders PDF pages to raster images
///
/// Implementations are blocking and are called from a blocking task. Each
/// call opens the document itself so pages are produced one at a time.
pub trait PageRasterizer: Send + Sync {
    fn page_count(&self, data: &[u8]) -> Result<usize, PdfBackendError>;

    /// Render the zero-based page `index` at `dpi`
    fn rasterize(&self, data: &[u8], index: usize, dpi: u32) -> Result<DynamicImage, PdfBackendError>;
}

/// Outcome of the direct-text phase
#[derive(Debug)]
enum DirectText {
    /// Untrimmed aggregate with at least one non-whitespace character
    Found(String),
    Empty,
    Unreadable(PdfBackendError),
}

/// Extractor for PDF documents
#[derive(Clone)]
pub struct PdfExtractor {
    reader: Arc<dyn TextLayerReader>,
    rasterizer: Arc<dyn PageRasterizer>,
    images: ImageExtractor,
    page_concurrency: usize,
}

impl PdfExtractor {
    pub fn new(
        reader: Arc<dyn TextLayerReader>,
        rasterizer: Arc<dyn PageRasterizer>,
        images: ImageExtractor,
    ) -> Self {
        Self {
            reader,
            rasterizer,
            images,
            page_concurrency: DEFAULT_PAGE_CONCURRENCY,
        }
    }

    /// Number of pages rasterized and recognized at once (at least 1)
    pub fn with_page_concurrency(mut self, page_concurrency: usize) -> Self {
        self.page_concurrency = page_concurrency.max(1);
        self
    }

    pub fn page_concurrency(&self) -> usize {
        self.page_concurrency
    }

    pub async fn extract(&self, data: Arc<Vec<u8>>) -> Result<ExtractionResult, ExtractionError> {
        info!(bytes = data.len(), "Extracting text from PDF");

        match self.direct_text(data.clone()).await? {
            DirectText::Found(text) => {
                let result = ExtractionResult::from_aggregate(&text);
                info!("Extracted {} characters from PDF text layer", result.length);
                return Ok(result);
            }
            DirectText::Empty => {
                info!("PDF has no embedded text, falling back to OCR");
            }
            DirectText::Unreadable(e) => {
                warn!(error = %e, "Direct PDF text extraction failed, falling back to OCR");
            }
        }

        self.ocr_fallback(data)
            .await
            .map_err(|e| e.context("Failed to extract text from PDF"))
    }

    async fn direct_text(&self, data: Arc<Vec<u8>>) -> Result<DirectText, ExtractionError> {
        let reader = self.reader.clone();
        let pages = match tokio::task::spawn_blocking(move || reader.page_texts(&data)).await? {
            Ok(pages) => pages,
            Err(e) => return Ok(DirectText::Unreadable(e)),
        };

        let mut aggregate = String::new();
        for text in pages.iter().filter(|t| !t.is_empty()) {
            aggregate.push_str(text);
            aggregate.push('\n');
        }

        if aggregate.trim().is_empty() {
            Ok(DirectText::Empty)
        } else {
            Ok(DirectText::Found(aggregate))
        }
    }

    async fn ocr_fallback(&self, data: Arc<Vec<u8>>) -> Result<ExtractionResult, ExtractionError> {
        let rasterizer = self.rasterizer.clone();
        let source = data.clone();
        let page_count = tokio::task::spawn_blocking(move || rasterizer.page_count(&source))
            .await?
            .map_err(|e| ExtractionError::ExtractionFailure(e.to_string()))?;

        info!(
            pages = page_count,
            dpi = RASTER_DPI,
            concurrency = self.page_concurrency,
            "Running OCR on rasterized PDF pages"
        );

        // buffered() yields in input order, so pages stay in document order
        let pages: Vec<String> = stream::iter(0..page_count)
            .map(|index| self.ocr_page(data.clone(), index, page_count))
            .buffered(self.page_concurrency)
            .try_collect()
            .await?;

        let mut aggregate = String::new();
        for text in &pages {
            aggregate.push_str(text);
            aggregate.push('\n');
        }

        let result = ExtractionResult::from_aggregate(&aggregate);
        info!(
            pages = pages.len(),
            "Extracted {} characters from PDF via OCR",
            result.length
        );
        Ok(result)
    }

    async fn ocr_page(&self, data: Arc<Vec<u8>>, index: usize, page_count: usize) -> Result<String, ExtractionError> {
        let rasterizer = self.rasterizer.clone();
        let image = tokio::task::spawn_blocking(move || rasterizer.rasterize(&data, index, RASTER_DPI))
            .await?
            .map_err(|e| ExtractionError::ExtractionFailure(e.to_string()))?;

        info!("Processing page {}/{}", index + 1, page_count);
        let page = self.images.extract_image(&image).await?;
        Ok(page.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{MockEngine, OcrEngine};
    use image::GenericImageView;

    /// In-memory PDF backend
    ///
    /// Page `i` rasterizes to a `(i + 1) x 1` image so OCR fakes can tell pages apart.
    struct FakePdf {
        text_layer: Option<Vec<String>>,
        pages: Option<usize>,
    }

    impl FakePdf {
        fn text(pages: &[&str]) -> Self {
            Self {
                text_layer: Some(pages.iter().map(|s| s.to_string()).collect()),
                pages: Some(pages.len()),
            }
        }

        fn scanned(pages: usize) -> Self {
            Self {
                text_layer: Some(vec![String::new(); pages]),
                pages: Some(pages),
            }
        }

        fn garbage() -> Self {
            Self {
                text_layer: None,
                pages: None,
            }
        }
    }

    impl TextLayerReader for FakePdf {
        fn page_texts(&self, _data: &[u8]) -> Result<Vec<String>, PdfBackendError> {
            self.text_layer
                .clone()
                .ok_or_else(|| PdfBackendError::Open("no header".into()))
        }
    }

    impl PageRasterizer for FakePdf {
        fn page_count(&self, _data: &[u8]) -> Result<usize, PdfBackendError> {
            self.pages.ok_or_else(|| PdfBackendError::Open("no header".into()))
        }

        fn rasterize(&self, _data: &[u8], index: usize, dpi: u32) -> Result<DynamicImage, PdfBackendError> {
            assert_eq!(dpi, RASTER_DPI);
            let pages = self.pages.ok_or_else(|| PdfBackendError::Open("no header".into()))?;
            if index >= pages {
                return Err(PdfBackendError::PageNotFound(index, pages));
            }
            Ok(DynamicImage::new_rgb8(index as u32 + 1, 1))
        }
    }

    /// OCR fake answering `texts[width - 1]`
    fn page_engine(texts: &[&str]) -> Arc<MockEngine> {
        let texts: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        Arc::new(MockEngine::new(move |image| {
            Ok(texts[image.dimensions().0 as usize - 1].clone())
        }))
    }

    fn extractor(pdf: FakePdf, engine: Arc<MockEngine>) -> PdfExtractor {
        let pdf = Arc::new(pdf);
        let engine: Arc<dyn OcrEngine> = engine;
        PdfExtractor::new(pdf.clone(), pdf, ImageExtractor::new(engine))
    }

    fn bytes() -> Arc<Vec<u8>> {
        Arc::new(b"%PDF-1.4 placeholder".to_vec())
    }

    #[tokio::test]
    async fn test_text_layer_skips_ocr() {
        let engine = page_engine(&["ocr 1", "ocr 2", "ocr 3"]);
        let pdf = FakePdf::text(&["", "  Chapter One  ", "Second page"]);

        let result = extractor(pdf, engine.clone()).extract(bytes()).await.unwrap();

        assert_eq!(result.text, "Chapter One  \nSecond page");
        assert_eq!(result.length, result.text.chars().count());
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_text_layer_falls_back() {
        let engine = page_engine(&["scanned"]);
        let pdf = FakePdf::text(&[" \n "]);

        let result = extractor(pdf, engine.clone()).extract(bytes()).await.unwrap();

        assert_eq!(result.text, "scanned");
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scanned_pages_in_order() {
        let engine = page_engine(&["Invoice #1\n", "Total: $50\n\n"]);
        let pdf = FakePdf::scanned(2);

        let result = extractor(pdf, engine.clone())
            .with_page_concurrency(1)
            .extract(bytes())
            .await
            .unwrap();

        assert_eq!(result.text, "Invoice #1\nTotal: $50");
        assert_eq!(result.length, 21);
        assert_eq!(engine.calls(), vec![(1, 1), (2, 1)]);
    }

    /// OCR fake where earlier pages take longer, so pages finish in reverse order
    struct SlowEarlyPagesEngine {
        pages: u32,
        finished: std::sync::Mutex<Vec<u32>>,
    }

    #[async_trait::async_trait]
    impl OcrEngine for SlowEarlyPagesEngine {
        fn name(&self) -> &str {
            "slow-early-pages"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn recognize(&self, image: &DynamicImage) -> Result<String, crate::ocr::OcrError> {
            let page = image.dimensions().0;
            let delay = u64::from(self.pages - page + 1) * 25;
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;

            self.finished.lock().unwrap().push(page);
            Ok(format!("page {}", page))
        }
    }

    #[tokio::test]
    async fn test_concurrent_pages_keep_document_order() {
        let pdf = Arc::new(FakePdf::scanned(6));
        let engine = Arc::new(SlowEarlyPagesEngine {
            pages: 6,
            finished: std::sync::Mutex::new(Vec::new()),
        });
        let ocr: Arc<dyn OcrEngine> = engine.clone();

        let result = PdfExtractor::new(pdf.clone(), pdf, ImageExtractor::new(ocr))
            .with_page_concurrency(4)
            .extract(bytes())
            .await
            .unwrap();

        let expected: Vec<String> = (1..=6).map(|p| format!("page {}", p)).collect();
        assert_eq!(result.text, expected.join("\n"));

        let finished = engine.finished.lock().unwrap().clone();
        assert_eq!(finished.len(), 6);
        assert_ne!(finished, vec![1, 2, 3, 4, 5, 6]);
        // the first window of four finishes back to front
        assert_eq!(&finished[..4], &[4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_blank_scan_is_empty_success() {
        let engine = page_engine(&["", "  "]);
        let result = extractor(FakePdf::scanned(2), engine.clone())
            .extract(bytes())
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(engine.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_text_layer_still_attempts_ocr() {
        let engine = page_engine(&["recovered"]);
        let pdf = FakePdf {
            text_layer: None,
            pages: Some(1),
        };

        let result = extractor(pdf, engine.clone()).extract(bytes()).await.unwrap();
        assert_eq!(result.text, "recovered");
    }

    #[tokio::test]
    async fn test_malformed_pdf_fails_at_rasterization() {
        let engine = page_engine(&[]);
        let err = extractor(FakePdf::garbage(), engine.clone())
            .extract(bytes())
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::ExtractionFailure(_)));
        assert!(err.to_string().starts_with("Failed to extract text from PDF: "));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_engine_unavailable_during_fallback() {
        let pdf = Arc::new(FakePdf::scanned(1));
        let engine: Arc<dyn OcrEngine> = Arc::new(MockEngine::unavailable());
        let extractor = PdfExtractor::new(pdf.clone(), pdf, ImageExtractor::new(engine));

        let err = extractor.extract(bytes()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn test_identical_bytes_identical_text() {
        let engine = page_engine(&["page a", "page b"]);
        let extractor = extractor(FakePdf::scanned(2), engine);

        let first = extractor.extract(bytes()).await.unwrap();
        let second = extractor.extract(bytes()).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_page_concurrency_floor() {
        let extractor = extractor(FakePdf::scanned(1), page_engine(&[])).with_page_concurrency(0);
        assert_eq!(extractor.page_concurrency(), 1);
    }
}
