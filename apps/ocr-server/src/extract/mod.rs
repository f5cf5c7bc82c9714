//! Extraction pipeline
//!
//! Turns an uploaded document into plain text:
//!
//! - **PDF**: embedded text layer first, per-page OCR when there is none
//! - **Word (.docx)**: body paragraphs, then flattened table rows
//! - **Images**: OCR of the full image
//!
//! Every extractor returns `Result<ExtractionResult, ExtractionError>`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_server::extract::{DocumentExtractor, ExtractOptions, SourceDocument};
//!
//! let extractor = DocumentExtractor::new(engine, Arc::new(MupdfBackend), ExtractOptions::default());
//! let doc = SourceDocument::new(bytes).with_filename("scan.png");
//! let result = extractor.extract(doc).await?;
//! println!("{} characters", result.length);
//! ```

mod dispatch;
mod docx;
mod error;
mod image;
mod pdf;
mod types;

pub use dispatch::{DocumentExtractor, ExtractOptions};
pub use docx::DocxExtractor;
pub use error::{ErrorKind, ExtractionError};
pub use self::image::ImageExtractor;
pub use pdf::{
    PageRasterizer, PdfBackendError, PdfExtractor, TextLayerReader, DEFAULT_PAGE_CONCURRENCY,
    RASTER_DPI,
};
pub use types::{ExtractionResult, FileType, SourceDocument, IMAGE_EXTENSIONS};
