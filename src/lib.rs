//! Sarcasm detection backend.
//!
//! Forwards text, audio or image content to the Gemini model (and OCR.space
//! for images) and normalizes the model's free-form reply into a fixed JSON
//! schema.
//!
//! * [`config`]: TOML settings with environment overrides.
//! * [`llm`]: prompts, the Gemini client and its retry layers.
//! * [`analysis`]: JSON recovery and field coercion.
//! * [`ocr`]: OCR.space client.
//! * [`rate_limit`]: process-wide fixed-window limiter.
//! * [`storage`]: upload persistence.
//! * [`pipeline`]: one analysis request, end to end.
//! * [`server`]: axum router and handlers.

pub mod analysis;
pub mod config;
pub mod llm;
pub mod ocr;
pub mod pipeline;
pub mod rate_limit;
pub mod server;
pub mod storage;
