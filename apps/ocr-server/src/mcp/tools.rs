//! Tool implementations

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::extract::{DocumentExtractor, ExtractionError, FileType, SourceDocument};

pub const EXTRACT_TEXT: &str = "extract_text";

/// Reply used when extraction succeeds but finds no text
pub const NO_TEXT_MESSAGE: &str = "No text could be extracted from the file.";

/// Protocol-level tool call failure, reported as a JSON-RPC error
#[derive(Debug, thiserror::Error)]
pub enum ToolCallError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("file_path and file_type are required")]
    MissingArguments,
}

/// Text returned to the client, flagged when it describes a failure
#[derive(Debug, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn to_result(&self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error,
        })
    }
}

/// List all available tools with their schemas
pub fn list_tools() -> Vec<Value> {
    vec![json!({
        "name": EXTRACT_TEXT,
        "description": "Extract text from PDF, Word, or image files using OCR",
        "inputSchema": {
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file to extract text from"
                },
                "file_type": {
                    "type": "string",
                    "enum": ["pdf", "docx", "image"],
                    "description": "Type of the file"
                }
            },
            "required": ["file_path", "file_type"]
        }
    })]
}

pub async fn call_tool(
    extractor: &DocumentExtractor,
    name: &str,
    arguments: &Value,
) -> Result<ToolOutput, ToolCallError> {
    if name != EXTRACT_TEXT {
        return Err(ToolCallError::UnknownTool(name.to_string()));
    }

    let file_path = arguments.get("file_path").and_then(Value::as_str).filter(|s| !s.is_empty());
    let file_type = arguments.get("file_type").and_then(Value::as_str).filter(|s| !s.is_empty());
    let (Some(file_path), Some(file_type)) = (file_path, file_type) else {
        return Err(ToolCallError::MissingArguments);
    };

    let output = match extract_file(extractor, file_path, file_type).await {
        Ok(text) if text.is_empty() => ToolOutput {
            text: NO_TEXT_MESSAGE.to_string(),
            is_error: false,
        },
        Ok(text) => ToolOutput { text, is_error: false },
        Err(e) => {
            warn!(file_path, kind = e.kind().as_str(), "Extraction failed: {}", e);
            ToolOutput {
                text: format!("Error extracting text: {}", e),
                is_error: true,
            }
        }
    };
    Ok(output)
}

async fn extract_file(
    extractor: &DocumentExtractor,
    file_path: &str,
    file_type: &str,
) -> Result<String, ExtractionError> {
    let file_type: FileType = file_type.parse()?;

    let data = tokio::fs::read(file_path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractionError::NotFound(file_path.to_string()),
        _ => ExtractionError::ExtractionFailure(format!("Failed to read {}: {}", file_path, e)),
    })?;
    info!(file_path, %file_type, bytes = data.len(), "Extracting text from file");

    let doc = SourceDocument::new(data)
        .with_type(file_type)
        .with_filename(file_path);
    Ok(extractor.extract(doc).await?.text)
}
