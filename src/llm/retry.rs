//! Caller-level retry.  Wraps any [`ModelClient`] and gives a failed
//! analysis call exactly one more attempt.
//!
//! This sits on top of the HTTP-level backoff inside the client: if the whole
//! `generate` call still fails, [`RetryOnceClient`] waits `delay` and calls it
//! once more.  The second error is returned as-is.  Transcription is passed
//! straight through.

use std::time::Duration;

use async_trait::async_trait;

use crate::llm::client::{LlmError, ModelClient};

// ---------------------------------------------------------------------------
// RetryOnceClient
// ---------------------------------------------------------------------------

/// A transparent wrapper that retries `generate` once after `delay`.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use sarcasm_detect::config::GeminiConfig;
/// use sarcasm_detect::llm::{GeminiClient, ModelClient, RetryOnceClient};
///
/// let inner = GeminiClient::from_config(&GeminiConfig::default());
/// let client: Box<dyn ModelClient> =
///     Box::new(RetryOnceClient::new(inner, Duration::from_secs(1)));
/// ```
pub struct RetryOnceClient<C: ModelClient> {
    inner: C,
    delay: Duration,
}

impl<C: ModelClient> RetryOnceClient<C> {
    pub fn new(inner: C, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for RetryOnceClient<C> {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        match self.inner.generate(prompt).await {
            Ok(text) => Ok(text),
            Err(first) => {
                log::error!("First model call failed: {first}; retrying once");
                tokio::time::sleep(self.delay).await;
                self.inner.generate(prompt).await.map_err(|second| {
                    log::error!("Model call failed after retry: {second}");
                    second
                })
            }
        }
    }

    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, LlmError> {
        self.inner.transcribe(audio, mime_type).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
