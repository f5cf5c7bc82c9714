//! OCR MCP Server
//!
//! Exposes `extract_text` to MCP clients over stdio.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocr_server::config::Config;
use ocr_server::mcp;
use ocr_server::state::build_extractor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging to stderr (stdout is for JSON-RPC)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ocr_server=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("OCR MCP Server v{} starting", env!("CARGO_PKG_VERSION"));

    let extractor = build_extractor(&config);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    mcp::serve(&extractor, stdin, tokio::io::stdout()).await?;

    tracing::info!("OCR MCP Server shutting down");
    Ok(())
}
