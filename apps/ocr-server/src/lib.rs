//! OCR Server Library
//!
//! Text extraction from PDF, Word (.docx) and image documents, with an HTTP
//! surface and a stdio tool server on top.
//!
//! # Modules
//!
//! - `extract`: Format dispatch and the per-format extractors
//! - `ocr`: OCR engine trait and the Tesseract implementation
//! - `mupdf`: PDF text layer and page rasterization
//! - `routes`: HTTP endpoints
//! - `mcp`: JSON-RPC tool server

pub mod config;
pub mod error;
pub mod extract;
pub mod mcp;
pub mod mupdf;
pub mod ocr;
pub mod routes;
pub mod state;
