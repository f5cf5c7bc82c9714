//! MCP (Model Context Protocol) tool server
//!
//! Newline-delimited JSON-RPC 2.0 over stdio exposing one tool,
//! `extract_text`. Stdout carries protocol messages only; logs go to stderr.

pub mod tools;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::extract::DocumentExtractor;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC: method does not exist
const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC: invalid method parameters
const INVALID_PARAMS: i32 = -32602;

/// MCP JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct McpRequest {
    #[allow(dead_code)]
    #[serde(default)]
    jsonrpc: String,
    /// Absent for notifications
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize)]
pub struct McpResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

/// MCP error object
#[derive(Debug, Serialize)]
pub struct McpError {
    code: i32,
    message: String,
}

impl McpResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(McpError { code, message }),
        }
    }
}

/// Handle one request; notifications produce no response
pub async fn handle_request(extractor: &DocumentExtractor, request: McpRequest) -> Option<McpResponse> {
    if request.method.starts_with("notifications/") {
        debug!(method = %request.method, "Received notification");
        return None;
    }

    let id = request.id.unwrap_or(Value::Null);

    let response = match request.method.as_str() {
        "initialize" => McpResponse::result(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": "ocr-server",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        ),

        "tools/list" => McpResponse::result(id, json!({ "tools": tools::list_tools() })),

        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            let name = params.get("name").and_then(Value::as_str).unwrap_or("");
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

            info!(tool = name, "Calling tool");

            match tools::call_tool(extractor, name, &arguments).await {
                Ok(output) => McpResponse::result(id, output.to_result()),
                Err(e) => {
                    warn!(tool = name, "Rejected tool call: {}", e);
                    McpResponse::error(id, INVALID_PARAMS, e.to_string())
                }
            }
        }

        _ => {
            warn!("Unknown method: {}", request.method);
            McpResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", request.method))
        }
    };

    Some(response)
}

/// Serve requests from `input` until end of stream, writing responses to `output`
pub async fn serve<R, W>(extractor: &DocumentExtractor, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: McpRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                error!("Invalid JSON: {} - line: {}", e, line);
                continue;
            }
        };

        debug!(method = %request.method, "Received request");

        let Some(response) = handle_request(extractor, request).await else {
            continue;
        };

        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        output.write_all(&payload).await?;
        output.flush().await?;
    }

    Ok(())
}
