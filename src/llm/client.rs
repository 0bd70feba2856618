//! Core `ModelClient` trait and the Gemini implementation.
//!
//! `GeminiClient` calls the `generateContent` endpoint configured in
//! [`GeminiConfig`].  When no API key is configured it runs in mock mode:
//! no network I/O, fixed canned responses, so the service stays usable
//! without credentials.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use crate::config::GeminiConfig;
use crate::llm::backoff::BackoffPolicy;
use crate::llm::envelope::Envelope;

/// Canned analysis returned in mock mode.
pub const MOCK_ANALYSIS: &str = r#"{"sarcasm_label":"not_sarcastic","sarcasm_intensity":5,"emotions":[{"label":"neutral","prob":0.8}],"risk_score":10,"highlights":["demo highlight"],"explanation":"This is a mocked analysis for demo/testing purposes."}"#;

/// Canned transcript returned in mock mode.
pub const MOCK_TRANSCRIPT: &str = "This is a mocked transcript for demo purposes.";

const TRANSCRIBE_INSTRUCTION: &str =
    "Generate a transcript of the speech in this audio. Return only the transcript text, nothing else.";

/// Longest body snippet written to the log.
const LOG_SNIPPET: usize = 500;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the model provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("model request timed out")]
    Timeout,

    /// The provider answered with a non-success status after retries.
    #[error("model provider returned HTTP {status}")]
    Status { status: u16, body: String },

    /// The HTTP response body was not JSON.
    #[error("failed to parse model response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ModelClient trait
// ---------------------------------------------------------------------------

/// Async interface to the text model.
///
/// Implementors must be `Send + Sync` so they can be shared across request
/// handlers as `Arc<dyn ModelClient>`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a complete prompt and return the model's raw text.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Transcribe `audio` (of the given MIME type) to plain text.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Calls Google's Generative Language `generateContent` endpoint.
///
/// The key travels in the `x-goog-api-key` header.  Transient failures are
/// retried according to the [`BackoffPolicy`] built from the same config.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
    backoff: BackoffPolicy,
}

impl GeminiClient {
    /// Build a client from config.
    ///
    /// Timeouts are applied per request (analysis and transcription differ),
    /// so the shared `reqwest::Client` carries none of its own.
    pub fn from_config(config: &GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
            backoff: BackoffPolicy::from_config(config),
        }
    }

    /// `true` when no API key is configured and calls return canned data.
    pub fn is_mock(&self) -> bool {
        self.config.effective_api_key().is_none()
    }

    async fn post(
        &self,
        api_key: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let response = self
            .backoff
            .send(|| {
                self.client
                    .post(&self.config.api_url)
                    .header("x-goog-api-key", api_key)
                    .timeout(timeout)
                    .json(body)
            })
            .await?;

        let status = response.status();
        let text = response.text().await?;
        log::debug!("Gemini response status: {status}");

        if !status.is_success() {
            log::error!(
                "Gemini API error {status}: {}",
                snippet(&text)
            );
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: snippet(&text).to_string(),
            });
        }

        let data: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            log::error!("Gemini returned non-JSON body: {}", snippet(&text));
            LlmError::Parse(e.to_string())
        })?;

        let envelope = Envelope::from_value(&data);
        log::debug!("Gemini envelope: {}", envelope.kind());
        Ok(envelope.into_text())
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let Some(api_key) = self.config.effective_api_key() else {
            log::warn!("GEMINI_API_KEY not set, returning mock response");
            return Ok(MOCK_ANALYSIS.to_string());
        };

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature":     self.config.temperature,
                "maxOutputTokens": self.config.max_output_tokens
            }
        });

        log::debug!("Calling Gemini API: url={}", self.config.api_url);
        self.post(
            api_key,
            &body,
            Duration::from_secs(self.config.timeout_secs),
        )
        .await
    }

    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, LlmError> {
        let Some(api_key) = self.config.effective_api_key() else {
            log::warn!("GEMINI_API_KEY not set, returning mock transcript");
            return Ok(MOCK_TRANSCRIPT.to_string());
        };

        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": TRANSCRIBE_INSTRUCTION },
                    { "inline_data": {
                        "mime_type": mime_type,
                        "data":      general_purpose::STANDARD.encode(audio)
                    } }
                ]
            }],
            "generationConfig": {
                "temperature":     0.0,
                "maxOutputTokens": self.config.transcribe_max_output_tokens
            }
        });

        log::info!(
            "Transcribing audio with Gemini (mime_type={mime_type}, size={} bytes)",
            audio.len()
        );
        let transcript = self
            .post(
                api_key,
                &body,
                Duration::from_secs(self.config.transcribe_timeout_secs),
            )
            .await?;
        let transcript = transcript.trim().to_string();
        log::info!("Transcription complete: {} chars", transcript.chars().count());
        Ok(transcript)
    }
}

fn snippet(text: &str) -> &str {
    match text.char_indices().nth(LOG_SNIPPET) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
