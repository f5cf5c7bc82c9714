//! Extraction types
//!
//! Input document, resolved file type and the extraction result.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::ExtractionError;

/// Extensions routed to the image extractor
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// Supported document type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Image,
}

impl FileType {
    /// Map a file extension (without the dot) to a type, case-insensitively
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            e if IMAGE_EXTENSIONS.contains(&e) => Some(Self::Image),
            _ => None,
        }
    }

    /// Map a filename to a type using the text after its last dot
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let ext = extension_of(filename);
        Self::from_extension(ext).ok_or_else(|| ExtractionError::UnsupportedType(ext.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = ExtractionError;

    /// Parse a transport type tag: `pdf`, `docx`, `image`, or an image extension
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        match tag.as_str() {
            "image" => Ok(Self::Image),
            other => Self::from_extension(other)
                .ok_or_else(|| ExtractionError::UnsupportedType(s.to_string())),
        }
    }
}

/// Text after the last dot, or empty when there is none
fn extension_of(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// An uploaded or opened document awaiting extraction
#[derive(Debug, Clone)]
pub struct SourceDocument {
    data: Arc<Vec<u8>>,
    file_type: Option<FileType>,
    filename: Option<String>,
}

impl SourceDocument {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            file_type: None,
            filename: None,
        }
    }

    /// Set the explicit type tag
    pub fn with_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    /// Set the filename hint used when no tag is given
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Resolve the type: explicit tag first, then the filename extension
    pub fn resolve_type(&self) -> Result<FileType, ExtractionError> {
        if let Some(file_type) = self.file_type {
            return Ok(file_type);
        }
        match &self.filename {
            Some(name) => FileType::from_filename(name),
            None => Err(ExtractionError::UnsupportedType("no file type or filename given".into())),
        }
    }
}

/// Text extracted from a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Character count of `text`
    pub length: usize,
}

impl ExtractionResult {
    /// Build the result from the untrimmed aggregate of all pages/parts
    pub fn from_aggregate(raw: &str) -> Self {
        let text = raw.trim().to_string();
        let length = text.chars().count();
        Self { text, length }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileType::from_extension("pdf"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("DOCX"), Some(FileType::Docx));
        for ext in ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "TIFF"] {
            assert_eq!(FileType::from_extension(ext), Some(FileType::Image), "{}", ext);
        }
        assert_eq!(FileType::from_extension("doc"), None);
        assert_eq!(FileType::from_extension("webp"), None);
        assert_eq!(FileType::from_extension(""), None);
    }

    #[test]
    fn test_from_filename_uses_last_dot() {
        assert_eq!(FileType::from_filename("scan.PNG").unwrap(), FileType::Image);
        assert_eq!(FileType::from_filename("report.final.pdf").unwrap(), FileType::Pdf);

        let err = FileType::from_filename("notes.txt").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: txt");

        assert!(matches!(
            FileType::from_filename("README"),
            Err(ExtractionError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!("pdf".parse::<FileType>().unwrap(), FileType::Pdf);
        assert_eq!("Image".parse::<FileType>().unwrap(), FileType::Image);
        assert_eq!("jpeg".parse::<FileType>().unwrap(), FileType::Image);
        assert!("xlsx".parse::<FileType>().is_err());
    }

    #[test]
    fn test_resolve_type_prefers_tag() {
        let doc = SourceDocument::new(vec![])
            .with_filename("scan.png")
            .with_type(FileType::Pdf);
        assert_eq!(doc.resolve_type().unwrap(), FileType::Pdf);

        let doc = SourceDocument::new(vec![]).with_filename("scan.PNG");
        assert_eq!(doc.resolve_type().unwrap(), FileType::Image);

        let doc = SourceDocument::new(vec![]);
        assert!(matches!(doc.resolve_type(), Err(ExtractionError::UnsupportedType(_))));
    }

    #[test]
    fn test_result_trims_and_counts_chars() {
        let result = ExtractionResult::from_aggregate("  Hello\nWorld\n\n");
        assert_eq!(result.text, "Hello\nWorld");
        assert_eq!(result.length, 11);

        let result = ExtractionResult::from_aggregate("Ünïcödé\n");
        assert_eq!(result.length, 7);

        let result = ExtractionResult::from_aggregate(" \n\t ");
        assert!(result.is_empty());
        assert_eq!(result.length, 0);
    }
}
