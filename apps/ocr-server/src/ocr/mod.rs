//! OCR Module
//!
//! Provides optical character recognition over raster images.
//!
//! The only backend is the Tesseract command-line tool, located once at
//! startup and invoked statelessly per image.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_server::ocr::{locate_tesseract, OcrEngine, TesseractEngine, DEFAULT_TESSERACT_PATHS};
//!
//! let binary = locate_tesseract(None, DEFAULT_TESSERACT_PATHS);
//! let engine = TesseractEngine::new(binary, "eng");
//!
//! let text = engine.recognize(&image::open("scan.png")?).await?;
//! ```

mod locate;
mod provider;
mod types;

pub use locate::{locate_tesseract, DEFAULT_TESSERACT_PATHS, TESSERACT_COMMAND};
pub use provider::{OcrEngine, TesseractEngine};
pub use types::OcrError;

#[cfg(test)]
pub use provider::MockEngine;
