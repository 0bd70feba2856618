//! Request pipeline for the analysis endpoints.
//!
//! [`AnalysisPipeline`] owns the injected collaborators (model client, OCR
//! client, rate limiter, optional upload store) and runs one analysis per
//! call.  The HTTP layer only parses requests into [`AnalysisRequest`],
//! [`VoiceInput`] or [`ImageInput`] and renders the outcome.
//!
//! # Architecture
//!
//! ```text
//! axum handler
//!      │  AnalysisRequest / VoiceInput / ImageInput
//!      ▼
//! AnalysisPipeline
//!      ├─ RateLimiter::allow
//!      ├─ UploadStore::save          (best effort)
//!      ├─ OcrClient / ModelClient::transcribe
//!      ├─ PromptBuilder → ModelClient::generate
//!      └─ extract_json_object → normalize_* → social::annotate
//! ```

pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{
    transcription_mime, AnalysisPipeline, AnalysisRequest, ImageInput, UploadedFile, VoiceInput,
};
