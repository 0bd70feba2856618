//! HTTP surface: router, shared state and CORS policy.
//!
//! ```text
//! GET  /health, /api/health   liveness
//! POST /api/analyze/text      JSON, default pipeline
//! POST /api/analyze           JSON, X-Domain selects the pipeline
//! POST /api/analyze/voice     multipart
//! POST /api/analyze/image     multipart, X-Domain aware
//! GET  /uploads/*             stored uploads (optional)
//! ```

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::pipeline::AnalysisPipeline;
use crate::storage::UPLOADS_ROUTE;

pub use error::ApiError;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the full application router.
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/analyze/text", post(handlers::analyze_text))
        .route("/api/analyze/voice", post(handlers::analyze_voice))
        .route("/api/analyze/image", post(handlers::analyze_image))
        .with_state(state);

    if config.storage.serve_uploads {
        let dir = config.storage.resolved_upload_dir();
        log::info!("Serving uploads from {} at {UPLOADS_ROUTE}", dir.display());
        router = router.nest_service(UPLOADS_ROUTE, ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(cors_layer(&config.server.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins = origins.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| origin_allowed(origin, &origins))
            },
        ))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Match `origin` against configured entries.  `"*"` admits everything and
/// `scheme://*.domain` admits any subdomain of `domain` over `scheme`.
pub fn origin_allowed(origin: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if pattern == "*" {
            return true;
        }
        match pattern.split_once("://*.") {
            Some((scheme, domain)) => origin
                .strip_prefix(scheme)
                .and_then(|rest| rest.strip_prefix("://"))
                .and_then(|host| host.strip_suffix(domain))
                .is_some_and(|sub| sub.len() > 1 && sub.ends_with('.')),
            None => pattern == origin,
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{GeminiConfig, OcrConfig};
    use crate::llm::GeminiClient;
    use crate::ocr::OcrSpaceClient;
    use crate::rate_limit::{FixedWindowLimiter, RateLimiter, Unlimited};

    const BOUNDARY: &str = "sarcasm-test-boundary";

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.serve_uploads = false;
        config
    }

    /// Router over a mock-mode Gemini client.
    fn router_with(limiter: Arc<dyn RateLimiter>) -> Router {
        let pipeline = AnalysisPipeline::new(
            Arc::new(GeminiClient::from_config(&GeminiConfig::default())),
            Arc::new(OcrSpaceClient::from_config(&OcrConfig::default())),
            limiter,
        );
        build_router(AppState::new(pipeline), &test_config())
    }

    fn router() -> Router {
        router_with(Arc::new(Unlimited))
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// `(name, Some((filename, content_type)) for files, content)`.
    fn multipart_post(
        uri: &str,
        parts: &[(&str, Option<(&str, &str)>, &[u8])],
    ) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((filename, content_type)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_endpoints() {
        for uri in ["/health", "/api/health"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let (status, body) = send(router(), request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"status": "ok"}));
        }
    }

    #[tokio::test]
    async fn empty_text_is_400() {
        let (status, body) = send(router(), json_post("/api/analyze/text", json!({"text": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Text is required"}));
    }

    #[tokio::test]
    async fn malformed_json_is_400_with_detail() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze/text")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(router(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn mock_mode_text_analysis() {
        let (status, body) = send(
            router(),
            json_post("/api/analyze/text", json!({"text": "Oh great, rain.", "context": null})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sarcasm_label"], "not_sarcastic");
        assert_eq!(body["sarcasm_intensity"], 5);
        assert_eq!(body["risk_score"], 10);
        assert_eq!(body["emotions"], json!([{"label": "neutral", "prob": 0.8}]));
        assert_eq!(body["highlights"], json!(["demo highlight"]));
        assert_eq!(body["mode_explanation"], Value::Null);
    }

    #[tokio::test]
    async fn combined_endpoint_honours_domain_header() {
        let mut request = json_post("/api/analyze", json!({"text": "Best day ever #not"}));
        request
            .headers_mut()
            .insert(handlers::DOMAIN_HEADER, HeaderValue::from_static("social_media"));
        let (status, body) = send(router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sarcasm_label"], "Neutral Post");
        assert!(body["mode_explanation"]
            .as_str()
            .is_some_and(|m| m.starts_with("Social media pipeline:")));

        let (_, body) = send(router(), json_post("/api/analyze", json!({"text": "Best day ever"}))).await;
        assert_eq!(body["sarcasm_label"], "not_sarcastic");
    }

    #[tokio::test]
    async fn rate_limited_request_is_429() {
        let router = router_with(Arc::new(FixedWindowLimiter::new(1, Duration::from_secs(60))));

        let (first, _) = send(router.clone(), json_post("/api/analyze", json!({"text": "a"}))).await;
        let (second, body) = send(router, json_post("/api/analyze", json!({"text": "b"}))).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, json!({"detail": "Rate limit exceeded, try again later"}));
    }

    #[tokio::test]
    async fn voice_with_transcript_field() {
        let request = multipart_post(
            "/api/analyze/voice",
            &[
                ("transcript", None, b"sure, I love waiting".as_slice()),
                ("acoustic_notes", None, b"drawn out vowels".as_slice()),
                ("audio_file", Some(("", "application/octet-stream")), b"".as_slice()),
            ],
        );
        let (status, body) = send(router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transcript"], "sure, I love waiting");
        assert_eq!(body["timestamps_explanations"], json!([]));
    }

    #[tokio::test]
    async fn voice_with_audio_uses_mock_transcript() {
        let request = multipart_post(
            "/api/analyze/voice",
            &[("audio_file", Some(("clip.webm", "audio/webm")), b"\x1a\x45\xdf\xa3".as_slice())],
        );
        let (status, body) = send(router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transcript"], crate::llm::MOCK_TRANSCRIPT);
    }

    #[tokio::test]
    async fn voice_without_input_is_400() {
        let request = multipart_post("/api/analyze/voice", &[("acoustic_notes", None, b"x".as_slice())]);
        let (status, body) = send(router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Either audio_file or transcript is required"}));
    }

    #[tokio::test]
    async fn image_with_manual_ocr_text() {
        let mut request = multipart_post(
            "/api/analyze/image",
            &[
                ("file", Some(("meme.png", "image/png")), b"\x89PNG".as_slice()),
                ("ocr_text", None, b"I just love Mondays".as_slice()),
            ],
        );
        request
            .headers_mut()
            .insert(handlers::DOMAIN_HEADER, HeaderValue::from_static("social_media"));
        let (status, body) = send(router(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ocr_text"], "I just love Mondays");
        assert_eq!(body["offensive_flag"], false);
        assert_eq!(body["attention_regions"], json!([]));
        assert_eq!(body["sarcasm_label"], "Neutral Post");
    }

    #[tokio::test]
    async fn image_without_file_is_400() {
        let request = multipart_post("/api/analyze/image", &[("ocr_text", None, b"text".as_slice())]);
        let (status, body) = send(router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Image file is required"}));
    }

    #[test]
    fn origin_matching() {
        let patterns: Vec<String> = vec![
            "http://localhost:5173".into(),
            "https://*.netlify.app".into(),
        ];
        assert!(origin_allowed("http://localhost:5173", &patterns));
        assert!(origin_allowed("https://preview-12.netlify.app", &patterns));
        assert!(!origin_allowed("https://netlify.app", &patterns));
        assert!(!origin_allowed("https://evilnetlify.app", &patterns));
        assert!(!origin_allowed("http://preview.netlify.app", &patterns));
        assert!(!origin_allowed("http://localhost:3000", &patterns));
        assert!(origin_allowed("https://anything.example", &["*".to_string()]));
    }
}
