//! Service entry point.
//!
//! # Startup sequence
//!
//! 1. Load `.env` (if any) and initialise logging.
//! 2. Load [`AppConfig`] from disk, then apply environment overrides.
//! 3. Build the model client ([`GeminiClient`] behind [`RetryOnceClient`]),
//!    the OCR client, the rate limiter and the upload store.
//! 4. Bind the listener and serve the router until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sarcasm_detect::{
    config::AppConfig,
    llm::{GeminiClient, RetryOnceClient},
    ocr::OcrSpaceClient,
    pipeline::AnalysisPipeline,
    rate_limit::FixedWindowLimiter,
    server::{build_router, AppState},
    storage::UploadStore,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Ok(path) = dotenv {
        log::info!("Loaded environment from {}", path.display());
    }
    log::info!("sarcasm-detect starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        let mut config = AppConfig::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    });

    // 3. Collaborators
    let gemini = GeminiClient::from_config(&config.gemini);
    if gemini.is_mock() {
        log::warn!("GEMINI_API_KEY not set; model calls return mocked responses");
    }
    let model = RetryOnceClient::new(
        gemini,
        Duration::from_millis(config.gemini.manual_retry_delay_ms),
    );

    let mut pipeline = AnalysisPipeline::new(
        Arc::new(model),
        Arc::new(OcrSpaceClient::from_config(&config.ocr)),
        Arc::new(FixedWindowLimiter::from_config(&config.rate_limit)),
    )
    .with_ocr_enabled(config.ocr.enabled)
    .with_asr_enabled(config.asr.enabled);

    if config.storage.persist_uploads {
        let dir = config.storage.resolved_upload_dir();
        match UploadStore::new(&dir) {
            Ok(store) => pipeline = pipeline.with_uploads(store),
            Err(e) => log::warn!("Uploads will not be stored: {e}"),
        }
    }
    log::info!(
        "OCR {}, ASR {}, rate limit {}/{}s",
        if config.ocr.enabled { "enabled" } else { "disabled" },
        if config.asr.enabled { "enabled" } else { "disabled" },
        config.rate_limit.per_minute,
        config.rate_limit.window_secs
    );

    // 4. Serve
    let app = build_router(AppState::new(pipeline), &config);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("sarcasm-detect shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
