//! axum handlers.  Each one turns the request into pipeline input, runs the
//! pipeline and renders the result as JSON.

use std::collections::HashMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::analysis::{AnalysisResult, ImageAnalysisResult, VoiceAnalysisResult};
use crate::llm::Domain;
use crate::pipeline::{AnalysisRequest, ImageInput, UploadedFile, VoiceInput};

use super::{ApiError, AppState};

/// Header selecting the analysis domain.
pub const DOMAIN_HEADER: &str = "x-domain";

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/analyze/text`: always the default pipeline.
pub async fn analyze_text(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(req) = payload?;
    state
        .pipeline
        .analyze_text(&req, Domain::Default)
        .await
        .map(Json)
}

/// `POST /api/analyze`: pipeline picked by the `X-Domain` header.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(req) = payload?;
    state
        .pipeline
        .analyze_text(&req, domain_of(&headers))
        .await
        .map(Json)
}

/// `POST /api/analyze/voice`: multipart `audio_file`, `transcript`,
/// `acoustic_notes`.
pub async fn analyze_voice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VoiceAnalysisResult>, ApiError> {
    let mut form = read_form(multipart?).await?;
    let input = VoiceInput {
        audio: form.files.remove("audio_file"),
        transcript: form.fields.remove("transcript"),
        acoustic_notes: form.fields.remove("acoustic_notes"),
    };
    state.pipeline.analyze_voice(input).await.map(Json)
}

/// `POST /api/analyze/image`: multipart `file`, `ocr_text`, `image_caption`;
/// `X-Domain` selects the social-media variant.
pub async fn analyze_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageAnalysisResult>, ApiError> {
    let mut form = read_form(multipart?).await?;
    let image = form
        .files
        .remove("file")
        .ok_or_else(|| ApiError::Validation("Image file is required".into()))?;
    let input = ImageInput {
        image,
        ocr_text: form.fields.remove("ocr_text"),
        image_caption: form.fields.remove("image_caption"),
    };
    state
        .pipeline
        .analyze_image(input, domain_of(&headers))
        .await
        .map(Json)
}

fn domain_of(headers: &HeaderMap) -> Domain {
    Domain::from_header(headers.get(DOMAIN_HEADER).and_then(|v| v.to_str().ok()))
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct FormData {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

/// Split a multipart body into file parts and plain text fields.
async fn read_form(mut multipart: Multipart) -> Result<FormData, ApiError> {
    let mut form = FormData::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // An unset file input still arrives as an empty part.
                if bytes.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    UploadedFile {
                        bytes: bytes.to_vec(),
                        filename: Some(filename).filter(|f| !f.is_empty()),
                        content_type,
                    },
                );
            }
            None => {
                form.fields.insert(name, field.text().await?);
            }
        }
    }
    Ok(form)
}
