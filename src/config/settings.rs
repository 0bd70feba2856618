//! Service settings structs, defaults, TOML persistence and environment
//! overrides.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! needs to name the values it changes.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP listener and cross-origin settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind, e.g. `"0.0.0.0"`.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Origins allowed by CORS.  An entry of the form `https://*.example.app`
    /// matches any subdomain of `example.app` over `https`.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body in bytes (multipart uploads included).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".into(),
                "http://localhost:3000".into(),
                "https://sarcasmdetect-ai.netlify.app".into(),
                "https://*.netlify.app".into(),
                "https://*.vercel.app".into(),
            ],
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// GeminiConfig
// ---------------------------------------------------------------------------

/// Settings for the Gemini model client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key.  `None` (or an empty string) switches the client into mock
    /// mode: no network I/O, canned responses.
    pub api_key: Option<String>,
    /// Full `generateContent` endpoint URL.
    pub api_url: String,
    /// Sampling temperature for analysis calls.
    pub temperature: f32,
    /// `maxOutputTokens` for analysis calls.
    pub max_output_tokens: u32,
    /// `maxOutputTokens` for transcription calls.
    pub transcribe_max_output_tokens: u32,
    /// Per-request timeout for analysis calls.
    pub timeout_secs: u64,
    /// Per-request timeout for audio transcription calls.
    pub transcribe_timeout_secs: u64,
    /// Automatic HTTP retries on top of the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff between HTTP retries.
    pub backoff_base_ms: u64,
    /// Response statuses that trigger an HTTP retry.
    pub retry_statuses: Vec<u16>,
    /// Delay before the single caller-level retry of a failed analysis call.
    pub manual_retry_delay_ms: u64,
}

impl GeminiConfig {
    /// The API key when one is actually configured (non-empty).
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-flash-latest:generateContent".into(),
            temperature: 0.0,
            max_output_tokens: 1000,
            transcribe_max_output_tokens: 2000,
            timeout_secs: 30,
            transcribe_timeout_secs: 60,
            max_retries: 3,
            backoff_base_ms: 500,
            retry_statuses: vec![429, 500, 502, 503, 504],
            manual_retry_delay_ms: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// OcrConfig
// ---------------------------------------------------------------------------

/// Settings for the OCR.space provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Run server-side OCR when the client did not send OCR text.
    pub enabled: bool,
    /// OCR.space API key (`"helloworld"` is the provider's public demo key).
    pub api_key: String,
    /// Parse endpoint.
    pub api_url: String,
    /// OCR language code.
    pub language: String,
    /// OCR.space engine number.
    pub engine: u8,
    /// Request timeout.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: "helloworld".into(),
            api_url: "https://api.ocr.space/parse/image".into(),
            language: "eng".into(),
            engine: 2,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// AsrConfig
// ---------------------------------------------------------------------------

/// Server-side speech recognition toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsrConfig {
    /// Transcribe uploaded audio through the model client.  When off, the
    /// voice endpoint only accepts a client-supplied transcript.
    pub enabled: bool,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// RateLimitConfig
// ---------------------------------------------------------------------------

/// Process-wide fixed-window rate limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Accepted requests per window.
    pub per_minute: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 120,
            window_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Local upload storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploaded files are written to.
    pub upload_dir: PathBuf,
    /// Persist uploaded image/audio bytes at all.
    pub persist_uploads: bool,
    /// Serve `upload_dir` under `/uploads`.
    pub serve_uploads: bool,
    /// Serverless deployment: only the temp dir is writable.
    pub serverless: bool,
}

impl StorageConfig {
    /// Directory actually used for uploads, honouring `serverless`.
    pub fn resolved_upload_dir(&self) -> PathBuf {
        if self.serverless {
            std::env::temp_dir().join("uploads")
        } else {
            self.upload_dir.clone()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            persist_uploads: true,
            serve_uploads: true,
            serverless: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level service configuration, serialised as `settings.toml`.
///
/// # Loading
///
/// ```rust,no_run
/// use sarcasm_detect::config::AppConfig;
///
/// // File (or defaults when missing), then environment overrides.
/// let config = AppConfig::load().unwrap();
/// assert!(config.rate_limit.per_minute > 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub ocr: OcrConfig,
    pub asr: AsrConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load `settings.toml` (path from `SARCASM_CONFIG`, else the platform
    /// config dir) and apply environment overrides on top.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("SARCASM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| AppPaths::new().settings_file);
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path.  Returns `Ok(AppConfig::default())` when
    /// the file does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override values from environment-style variables.
    ///
    /// `lookup` abstracts `std::env::var` so tests can feed a fixed map.
    /// Unparseable numeric or boolean values are logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key).filter(|k| !k.trim().is_empty());
        }
        if let Some(url) = lookup("GEMINI_API_URL").filter(|u| !u.trim().is_empty()) {
            self.gemini.api_url = url;
        }
        if let Some(key) = lookup("OCR_SPACE_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.ocr.api_key = key;
        }
        if let Some(flag) = lookup("ENABLE_OCR") {
            self.ocr.enabled = flag.trim().eq_ignore_ascii_case("true");
        }
        if let Some(flag) = lookup("ENABLE_ASR") {
            self.asr.enabled = flag.trim().eq_ignore_ascii_case("true");
        }
        if lookup("VERCEL").is_some_and(|v| !v.is_empty()) {
            self.storage.serverless = true;
        }
        if let Some(dir) = lookup("UPLOAD_DIR").filter(|d| !d.trim().is_empty()) {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(p) => self.server.port = p,
                Err(_) => log::warn!("Ignoring invalid PORT value {port:?}"),
            }
        }
        if let Some(limit) = lookup("RATE_LIMIT_PER_MIN") {
            match limit.trim().parse() {
                Ok(n) => self.rate_limit.per_minute = n,
                Err(_) => log::warn!("Ignoring invalid RATE_LIMIT_PER_MIN value {limit:?}"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
