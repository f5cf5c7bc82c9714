//! Configuration management for the OCR server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::extract::{ExtractOptions, DEFAULT_PAGE_CONCURRENCY};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Explicit Tesseract binary; searched in well-known locations when unset
    pub tesseract_cmd: Option<PathBuf>,
    pub language: String,
    pub page_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    pub docx_include_tables: bool,
    pub max_upload_bytes: usize,
    /// Per-request deadline, `0` disables it
    pub timeout_secs: u64,
}

impl ExtractConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            ocr: OcrConfig {
                tesseract_cmd: None,
                language: "eng".to_string(),
                page_concurrency: DEFAULT_PAGE_CONCURRENCY,
            },
            extract: ExtractConfig {
                docx_include_tables: true,
                max_upload_bytes: 10 * 1024 * 1024,
                timeout_secs: 120,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Self::from_vars(|key| env::var(key))
    }

    /// Build from a variable lookup; unset or malformed values keep their default
    pub fn from_vars<F>(lookup: F) -> Result<Self, env::VarError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |key: &str| match lookup(key) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value.trim().to_string())),
            Ok(_) | Err(env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(e),
        };
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST")?.unwrap_or(defaults.server.host),
                port: parse_or(var("PORT")?, defaults.server.port),
            },
            ocr: OcrConfig {
                tesseract_cmd: var("TESSERACT_CMD")?.map(PathBuf::from),
                language: var("OCR_LANGUAGE")?.unwrap_or(defaults.ocr.language),
                page_concurrency: parse_or(var("OCR_PAGE_CONCURRENCY")?, defaults.ocr.page_concurrency)
                    .max(1),
            },
            extract: ExtractConfig {
                docx_include_tables: var("DOCX_INCLUDE_TABLES")?
                    .and_then(|v| parse_bool(&v))
                    .unwrap_or(defaults.extract.docx_include_tables),
                max_upload_bytes: parse_or(var("MAX_UPLOAD_BYTES")?, defaults.extract.max_upload_bytes),
                timeout_secs: parse_or(var("EXTRACT_TIMEOUT_SECS")?, defaults.extract.timeout_secs),
            },
        })
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            page_concurrency: self.ocr.page_concurrency,
            docx_include_tables: self.extract.docx_include_tables,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
