//! MuPDF PDF backend
//!
//! MuPDF documents are not thread-safe, so nothing is cached: every call
//! opens a fresh document from the shared bytes, does its work on the
//! calling (blocking) thread and drops it.

use image::DynamicImage;
use mupdf::{Colorspace, Document, Matrix};
use tracing::debug;

use super::render::pixmap_to_image;
use crate::extract::{PageRasterizer, PdfBackendError, TextLayerReader};

const PDF_MIME: &str = "application/pdf";

/// PDF user space units per inch
const POINTS_PER_INCH: f32 = 72.0;

impl From<mupdf::Error> for PdfBackendError {
    fn from(e: mupdf::Error) -> Self {
        PdfBackendError::Backend(e.to_string())
    }
}

/// Embedded-text reader and page rasterizer backed by MuPDF
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    fn open(data: &[u8]) -> Result<Document, PdfBackendError> {
        Document::from_bytes(data, PDF_MIME).map_err(|e| PdfBackendError::Open(e.to_string()))
    }
}

impl TextLayerReader for MupdfBackend {
    fn page_texts(&self, data: &[u8]) -> Result<Vec<String>, PdfBackendError> {
        let doc = Self::open(data)?;
        let page_count = doc.page_count()? as usize;

        let mut texts = Vec::with_capacity(page_count);
        for i in 0..page_count {
            let page = doc.load_page(i as i32)?;
            texts.push(page.to_text()?);
        }

        debug!(pages = page_count, "Read PDF text layer");
        Ok(texts)
    }
}

impl PageRasterizer for MupdfBackend {
    fn page_count(&self, data: &[u8]) -> Result<usize, PdfBackendError> {
        let doc = Self::open(data)?;
        Ok(doc.page_count()? as usize)
    }

    fn rasterize(&self, data: &[u8], index: usize, dpi: u32) -> Result<DynamicImage, PdfBackendError> {
        let doc = Self::open(data)?;
        let page_count = doc.page_count()? as usize;
        if index >= page_count {
            return Err(PdfBackendError::PageNotFound(index + 1, page_count));
        }

        let page = doc.load_page(index as i32)?;
        let scale = dpi as f32 / POINTS_PER_INCH;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, false)
            .map_err(|e| PdfBackendError::Render(index + 1, e.to_string()))?;

        debug!(
            page = index + 1,
            width = pixmap.width(),
            height = pixmap.height(),
            dpi,
            "Rasterized PDF page"
        );
        pixmap_to_image(&pixmap, index + 1)
    }
}
