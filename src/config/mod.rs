//! Configuration module for the sarcasm detection service.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for the platform config directory, TOML persistence via
//! `AppConfig::load_from` / `AppConfig::save_to`, and environment overrides
//! via `AppConfig::apply_env`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, AsrConfig, GeminiConfig, OcrConfig, RateLimitConfig, ServerConfig, StorageConfig,
};
