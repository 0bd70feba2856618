//! Model-facing half of the service.
//!
//! This module provides:
//! * [`ModelClient`]: async trait implemented by every model backend.
//! * [`GeminiClient`]: Gemini `generateContent` client with mock mode.
//! * [`RetryOnceClient`]: wraps any client; one extra attempt on failure.
//! * [`BackoffPolicy`]: HTTP-level retry with exponential backoff.
//! * [`Envelope`]: provider response layouts and text extraction.
//! * [`PromptBuilder`] / [`Domain`]: prompt construction per pipeline.
//! * [`LlmError`]: error variants for model calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sarcasm_detect::config::AppConfig;
//! use sarcasm_detect::llm::{Domain, GeminiClient, ModelClient, PromptBuilder, RetryOnceClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let client = RetryOnceClient::new(
//!         GeminiClient::from_config(&config.gemini),
//!         Duration::from_secs(1),
//!     );
//!
//!     let prompt = PromptBuilder::new(Domain::Default).text_prompt("Oh great, it's raining.", &[]);
//!     let raw = client.generate(&prompt).await.unwrap();
//!     println!("{raw}");
//! }
//! ```

pub mod backoff;
pub mod client;
pub mod envelope;
pub mod prompt;
pub mod retry;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use backoff::BackoffPolicy;
pub use client::{GeminiClient, LlmError, ModelClient, MOCK_ANALYSIS, MOCK_TRANSCRIPT};
pub use envelope::Envelope;
pub use prompt::{Domain, PromptBuilder};
pub use retry::RetryOnceClient;
