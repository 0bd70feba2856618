//! Optical character recognition through the OCR.space parse API.
//!
//! [`OcrSpaceClient`] uploads the image as a multipart file and returns the
//! first parsed text block.  Provider-side failures come back as
//! [`OcrError::Provider`] carrying the provider's own message, which the
//! request handlers inspect to pick a user-facing status.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;

use crate::config::OcrConfig;

/// Provider message fragments meaning "this image cannot be processed".
const UNPROCESSABLE_MARKERS: &[&str] = &["E301", "Unable to process"];

// ---------------------------------------------------------------------------
// OcrError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// HTTP transport error, timeout, or non-success status.
    #[error("OCR request failed: {0}")]
    Request(String),

    /// The provider processed the request but reported a failure.
    #[error("OCR failed: {0}")]
    Provider(String),

    /// The response did not have the expected shape.
    #[error("unexpected OCR response: {0}")]
    Parse(String),
}

impl OcrError {
    /// `true` when the provider rejected the image itself (wrong format,
    /// too small, corrupt) rather than failing for an operational reason.
    pub fn is_unprocessable_image(&self) -> bool {
        match self {
            OcrError::Provider(msg) => UNPROCESSABLE_MARKERS.iter().any(|m| msg.contains(m)),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for OcrError {
    fn from(e: reqwest::Error) -> Self {
        OcrError::Request(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// OcrClient trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Extract the text visible in `image`.
    async fn extract_text(&self, image: &[u8], filename: &str) -> Result<String, OcrError>;
}

// ---------------------------------------------------------------------------
// OcrSpaceClient
// ---------------------------------------------------------------------------

pub struct OcrSpaceClient {
    client: reqwest::Client,
    config: OcrConfig,
}

impl OcrSpaceClient {
    pub fn from_config(config: &OcrConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl OcrClient for OcrSpaceClient {
    async fn extract_text(&self, image: &[u8], filename: &str) -> Result<String, OcrError> {
        let part = Part::bytes(image.to_vec())
            .file_name(filename.to_string())
            .mime_str("image/png")?;
        let form = Form::new()
            .text("apikey", self.config.api_key.clone())
            .text("language", self.config.language.clone())
            .text("OCREngine", self.config.engine.to_string())
            .part("file", part);

        log::info!("Running OCR on {filename} ({} bytes)", image.len());
        let response = self
            .client
            .post(&self.config.api_url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| OcrError::Parse(e.to_string()))?;
        log::debug!("OCR.space response: {body}");
        parse_response(&body)
    }
}

/// Interpret an OCR.space JSON body.
pub fn parse_response(body: &Value) -> Result<String, OcrError> {
    if body.get("OCRExitCode").and_then(Value::as_i64) != Some(1) {
        return Err(OcrError::Provider(provider_message(body)));
    }
    body.get("ParsedResults")
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("ParsedText"))
        .and_then(Value::as_str)
        .map(|t| t.trim().to_string())
        .ok_or_else(|| OcrError::Parse("missing ParsedResults[0].ParsedText".into()))
}

/// `ErrorMessage` (string or first list entry), else `ErrorDetails`.
fn provider_message(body: &Value) -> String {
    ["ErrorMessage", "ErrorDetails"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
