//! Tesseract binary location
//!
//! Resolved once at startup and injected into [`TesseractEngine`](super::TesseractEngine).

use std::path::{Path, PathBuf};

/// Well-known installation locations, checked in order
pub const DEFAULT_TESSERACT_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// Bare command name, resolved through `PATH` by the OS
pub const TESSERACT_COMMAND: &str = "tesseract";

/// Resolve the Tesseract binary
///
/// An explicit override always wins, even when it does not exist, so that a
/// misconfiguration surfaces as an unavailable engine instead of silently
/// picking another install. Otherwise the first existing candidate is used,
/// falling back to the bare command name.
pub fn locate_tesseract(explicit: Option<&Path>, candidates: &[&str]) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    candidates
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(TESSERACT_COMMAND))
}
