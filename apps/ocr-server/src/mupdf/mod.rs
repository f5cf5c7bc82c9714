//! MuPDF Backend
//!
//! Concrete PDF backend for the extraction pipeline: reads the embedded text
//! layer and rasterizes pages for OCR.
//!
//! # Thread Safety
//!
//! MuPDF's `fz_context` is **NOT thread-safe**. The backend never shares a
//! document between calls: each operation opens a fresh document from the
//! request's bytes on a blocking thread.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ocr_server::mupdf::MupdfBackend;
//! use ocr_server::extract::{PageRasterizer, RASTER_DPI};
//!
//! let pages = MupdfBackend.page_count(&pdf_bytes)?;
//! let first = MupdfBackend.rasterize(&pdf_bytes, 0, RASTER_DPI)?;
//! ```

mod backend;
mod render;

pub use backend::MupdfBackend;

#[cfg(test)]
pub(crate) use backend::tests::minimal_pdf;
