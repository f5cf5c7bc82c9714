//! Format dispatch
//!
//! Single entry point of the extraction pipeline: resolves the document type
//! once and hands the bytes to exactly one extractor.

use std::sync::Arc;

use tracing::{info, instrument};

use super::docx::DocxExtractor;
use super::error::ExtractionError;
use super::image::ImageExtractor;
use super::pdf::{PageRasterizer, PdfExtractor, TextLayerReader, DEFAULT_PAGE_CONCURRENCY};
use super::types::{ExtractionResult, FileType, SourceDocument};
use crate::ocr::OcrEngine;

/// Extraction tuning shared by every request
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Pages recognized at once during PDF OCR fallback
    pub page_concurrency: usize,
    /// Append flattened table rows to Word document text
    pub docx_include_tables: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            page_concurrency: DEFAULT_PAGE_CONCURRENCY,
            docx_include_tables: true,
        }
    }
}

/// Routes documents to the PDF, Word or image extractor
#[derive(Clone)]
pub struct DocumentExtractor {
    pdf: PdfExtractor,
    docx: DocxExtractor,
    image: ImageExtractor,
}

impl DocumentExtractor {
    /// Wire the extractors around one OCR engine and one PDF backend
    pub fn new<B>(engine: Arc<dyn OcrEngine>, pdf_backend: Arc<B>, options: ExtractOptions) -> Self
    where
        B: TextLayerReader + PageRasterizer + 'static,
    {
        let image = ImageExtractor::new(engine);
        let pdf = PdfExtractor::new(pdf_backend.clone(), pdf_backend, image.clone())
            .with_page_concurrency(options.page_concurrency);

        Self {
            pdf,
            docx: DocxExtractor::new(options.docx_include_tables),
            image,
        }
    }

    pub fn engine(&self) -> &Arc<dyn OcrEngine> {
        self.image.engine()
    }

    /// Extract the text of a document
    #[instrument(skip_all, fields(filename = doc.filename(), bytes = doc.data().len()))]
    pub async fn extract(&self, doc: SourceDocument) -> Result<ExtractionResult, ExtractionError> {
        let file_type = doc.resolve_type()?;
        info!(%file_type, "Dispatching extraction");

        let data = doc.data().clone();
        match file_type {
            FileType::Pdf => self.pdf.extract(data).await,
            FileType::Docx => {
                let docx = self.docx;
                tokio::task::spawn_blocking(move || docx.extract(&data)).await?
            }
            FileType::Image => self.image.extract_bytes(data).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::docx::tests::{build_docx, paragraph};
    use crate::extract::image::tests::encoded_image;
    use crate::extract::pdf::PdfBackendError;
    use crate::ocr::MockEngine;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// PDF backend counting how often it is touched
    #[derive(Default)]
    struct CountingPdf {
        opened: AtomicUsize,
    }

    impl TextLayerReader for CountingPdf {
        fn page_texts(&self, _data: &[u8]) -> Result<Vec<String>, PdfBackendError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["embedded".to_string()])
        }
    }

    impl PageRasterizer for CountingPdf {
        fn page_count(&self, _data: &[u8]) -> Result<usize, PdfBackendError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }

        fn rasterize(&self, _data: &[u8], _index: usize, _dpi: u32) -> Result<DynamicImage, PdfBackendError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(DynamicImage::new_rgb8(1, 1))
        }
    }

    fn setup(engine: Arc<MockEngine>) -> (DocumentExtractor, Arc<CountingPdf>) {
        let pdf = Arc::new(CountingPdf::default());
        let extractor = DocumentExtractor::new(engine, pdf.clone(), ExtractOptions::default());
        (extractor, pdf)
    }

    #[tokio::test]
    async fn test_filename_routes_to_image() {
        let engine = Arc::new(MockEngine::returning("from image"));
        let (extractor, pdf) = setup(engine.clone());

        let png = encoded_image(3, 2, image::ImageFormat::Png);
        let doc = SourceDocument::new(png).with_filename("scan.PNG");

        let result = extractor.extract(doc).await.unwrap();
        assert_eq!(result.text, "from image");
        assert_eq!(engine.calls(), vec![(3, 2)]);
        assert_eq!(pdf.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tag_routes_to_pdf() {
        let engine = Arc::new(MockEngine::returning("unused"));
        let (extractor, pdf) = setup(engine.clone());

        let doc = SourceDocument::new(b"%PDF".to_vec())
            .with_type(FileType::Pdf)
            .with_filename("misleading.docx");

        let result = extractor.extract(doc).await.unwrap();
        assert_eq!(result.text, "embedded");
        assert_eq!(pdf.opened.load(Ordering::SeqCst), 1);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_docx_route() {
        let (extractor, _) = setup(Arc::new(MockEngine::returning("unused")));
        let docx = build_docx(&format!("{}{}", paragraph("Hello"), paragraph("World")));

        let result = extractor
            .extract(SourceDocument::new(docx).with_filename("letter.docx"))
            .await
            .unwrap();
        assert_eq!(result.text, "Hello\nWorld");
        assert_eq!(result.length, 11);
    }

    #[tokio::test]
    async fn test_unsupported_type_before_any_extractor() {
        let engine = Arc::new(MockEngine::returning("unused"));
        let (extractor, pdf) = setup(engine.clone());

        let err = extractor
            .extract(SourceDocument::new(b"plain".to_vec()).with_filename("notes.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(ref ext) if ext == "txt"));

        let err = extractor.extract(SourceDocument::new(vec![1, 2, 3])).await.unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(_)));

        assert_eq!(engine.call_count(), 0);
        assert_eq!(pdf.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_retry_with_other_type() {
        let engine = Arc::new(MockEngine::returning("unused"));
        let (extractor, _) = setup(engine.clone());

        // PDF bytes declared as an image fail to decode and are not re-dispatched
        let doc = SourceDocument::new(b"%PDF-1.4".to_vec()).with_type(FileType::Image);
        let err = extractor.extract(doc).await.unwrap_err();

        assert!(matches!(err, ExtractionError::DecodeFailure(_)));
        assert_eq!(engine.call_count(), 0);
    }
}
