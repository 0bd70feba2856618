//! Analysis pipeline: drives one request from validated input to a typed
//! result.
//!
//! # Pipeline flow
//!
//! ```text
//! validate input ──▶ rate limit ──▶ [persist upload] ──▶ [OCR | transcribe]
//!       └─▶ build prompt ──▶ ModelClient::generate ──▶ extract JSON object
//!             └─▶ normalize ──▶ [social-media annotate] ──▶ result
//! ```
//!
//! Every collaborator is injected as a trait object so request handlers and
//! tests share one code path.  Nothing here knows about HTTP beyond the
//! [`ApiError`] each failure maps to.

use std::sync::Arc;

use serde::Deserialize;

use crate::analysis::social::{self, Source};
use crate::analysis::{
    extract_json_object, normalize_analysis, normalize_image, normalize_voice, AnalysisResult,
    ImageAnalysisResult, JsonObject, VoiceAnalysisResult,
};
use crate::llm::{Domain, ModelClient, PromptBuilder};
use crate::ocr::{OcrClient, OcrError};
use crate::rate_limit::RateLimiter;
use crate::server::ApiError;
use crate::storage::UploadStore;

/// Filename handed to the OCR provider when the client sent none.
const DEFAULT_IMAGE_NAME: &str = "upload_image.png";

/// MIME type assumed for audio uploads without one.
const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Longest raw model output written to the log on a parse failure.
const RAW_LOG_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// JSON body of the text endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Required; missing is treated like empty.
    #[serde(default)]
    pub text: Option<String>,
    /// Prior conversation lines, oldest first.
    #[serde(default)]
    pub context: Option<Vec<String>>,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// One uploaded file part.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// Voice endpoint input: an audio clip, a transcript, or both.
#[derive(Debug, Clone, Default)]
pub struct VoiceInput {
    pub audio: Option<UploadedFile>,
    pub transcript: Option<String>,
    pub acoustic_notes: Option<String>,
}

/// Image endpoint input.
#[derive(Debug, Clone, Default)]
pub struct ImageInput {
    pub image: UploadedFile,
    /// Text already recognised by the client; skips server-side OCR.
    pub ocr_text: Option<String>,
    pub image_caption: Option<String>,
}

// ---------------------------------------------------------------------------
// AnalysisPipeline
// ---------------------------------------------------------------------------

/// Runs text, voice and image analyses against injected collaborators.
///
/// ```rust
/// use std::sync::Arc;
/// use sarcasm_detect::config::AppConfig;
/// use sarcasm_detect::llm::{Domain, GeminiClient};
/// use sarcasm_detect::ocr::OcrSpaceClient;
/// use sarcasm_detect::pipeline::{AnalysisPipeline, AnalysisRequest};
/// use sarcasm_detect::rate_limit::Unlimited;
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = AppConfig::default(); // no API key: mock mode
/// let pipeline = AnalysisPipeline::new(
///     Arc::new(GeminiClient::from_config(&config.gemini)),
///     Arc::new(OcrSpaceClient::from_config(&config.ocr)),
///     Arc::new(Unlimited),
/// );
///
/// let result = pipeline
///     .analyze_text(&AnalysisRequest::new("Oh great, more rain."), Domain::Default)
///     .await
///     .unwrap();
/// assert_eq!(result.sarcasm_label, "not_sarcastic");
/// # }
/// ```
pub struct AnalysisPipeline {
    model: Arc<dyn ModelClient>,
    ocr: Arc<dyn OcrClient>,
    limiter: Arc<dyn RateLimiter>,
    uploads: Option<UploadStore>,
    ocr_enabled: bool,
    asr_enabled: bool,
}

impl AnalysisPipeline {
    /// Create a pipeline with OCR and transcription enabled and uploads not
    /// persisted.
    pub fn new(
        model: Arc<dyn ModelClient>,
        ocr: Arc<dyn OcrClient>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            model,
            ocr,
            limiter,
            uploads: None,
            ocr_enabled: true,
            asr_enabled: true,
        }
    }

    pub fn with_uploads(mut self, store: UploadStore) -> Self {
        self.uploads = Some(store);
        self
    }

    pub fn with_ocr_enabled(mut self, enabled: bool) -> Self {
        self.ocr_enabled = enabled;
        self
    }

    pub fn with_asr_enabled(mut self, enabled: bool) -> Self {
        self.asr_enabled = enabled;
        self
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    /// Analyze free text under `domain`.
    pub async fn analyze_text(
        &self,
        req: &AnalysisRequest,
        domain: Domain,
    ) -> Result<AnalysisResult, ApiError> {
        let text = non_blank(req.text.as_deref())
            .ok_or_else(|| ApiError::Validation("Text is required".into()))?;
        self.admit()?;

        log::info!(
            "Text analysis ({}) for user {:?}: {} chars",
            domain.as_str(),
            req.user_id.as_deref().unwrap_or("-"),
            text.len()
        );
        let context = req.context.as_deref().unwrap_or_default();
        let prompt = PromptBuilder::new(domain).text_prompt(text, context);
        let obj = self.generate_object(&prompt).await?;

        let mut result = normalize_analysis(&obj);
        if domain == Domain::SocialMedia {
            social::annotate(&mut result, Source::Text);
        }
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Voice
    // -----------------------------------------------------------------------

    /// Analyze an audio clip (transcribed first) or a supplied transcript.
    pub async fn analyze_voice(&self, input: VoiceInput) -> Result<VoiceAnalysisResult, ApiError> {
        let supplied = non_blank(input.transcript.as_deref()).map(str::to_string);
        if input.audio.is_none() && supplied.is_none() {
            return Err(ApiError::Validation(
                "Either audio_file or transcript is required".into(),
            ));
        }
        self.admit()?;

        let transcript = match &input.audio {
            Some(audio) => {
                self.persist(audio, "audio_upload").await;
                if self.asr_enabled {
                    self.transcribe(audio).await?
                } else {
                    supplied.ok_or_else(|| {
                        ApiError::Validation(
                            "Audio transcription is disabled; provide a transcript".into(),
                        )
                    })?
                }
            }
            None => supplied.unwrap_or_default(),
        };

        let prompt = PromptBuilder::new(Domain::Default)
            .voice_prompt(&transcript, input.acoustic_notes.as_deref());
        let obj = self.generate_object(&prompt).await?;
        Ok(normalize_voice(&obj, transcript))
    }

    async fn transcribe(&self, audio: &UploadedFile) -> Result<String, ApiError> {
        let mime = transcription_mime(audio.content_type.as_deref());
        log::info!(
            "Transcribing {} ({} bytes, {mime})",
            audio.filename.as_deref().unwrap_or("audio"),
            audio.bytes.len()
        );
        let transcript = self.model.transcribe(&audio.bytes, mime).await.map_err(|e| {
            log::error!("Audio transcription failed: {e}");
            ApiError::Transcription
        })?;
        log::info!("Transcription complete: {} chars", transcript.len());
        Ok(transcript)
    }

    // -----------------------------------------------------------------------
    // Image
    // -----------------------------------------------------------------------

    /// Analyze the text in an image, running OCR unless the client supplied
    /// the text.
    pub async fn analyze_image(
        &self,
        input: ImageInput,
        domain: Domain,
    ) -> Result<ImageAnalysisResult, ApiError> {
        let manual = non_blank(input.ocr_text.as_deref()).map(str::to_string);
        if manual.is_none() && !self.ocr_enabled {
            return Err(ApiError::Validation(
                "OCR text is required for demo (paste OCR text) unless OCR is configured on server)."
                    .into(),
            ));
        }
        self.admit()?;
        self.persist(&input.image, "image_upload").await;

        let ocr_text = match manual {
            Some(text) => text,
            None => self.recognise(&input.image).await?,
        };

        let prompt = PromptBuilder::new(domain)
            .image_prompt(&ocr_text, input.image_caption.as_deref());
        let obj = self.generate_object(&prompt).await?;

        let mut result = normalize_image(&obj, ocr_text);
        if domain == Domain::SocialMedia {
            social::annotate(&mut result.analysis, Source::Image);
        }
        Ok(result)
    }

    async fn recognise(&self, image: &UploadedFile) -> Result<String, ApiError> {
        let filename = image.filename.as_deref().unwrap_or(DEFAULT_IMAGE_NAME);
        match self.ocr.extract_text(&image.bytes, filename).await {
            Ok(text) if text.trim().is_empty() => Err(ApiError::Validation(
                "OCR did not extract text; provide OCR manually.".into(),
            )),
            Ok(text) => Ok(text),
            Err(e) if e.is_unprocessable_image() => {
                log::warn!("OCR provider rejected {filename}: {e}");
                Err(ApiError::UnprocessableImage)
            }
            Err(OcrError::Provider(msg)) | Err(OcrError::Request(msg)) => {
                log::error!("OCR error: {msg}");
                Err(ApiError::Ocr(msg))
            }
            Err(e @ OcrError::Parse(_)) => {
                log::error!("OCR error: {e}");
                Err(ApiError::OcrUnavailable)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn admit(&self) -> Result<(), ApiError> {
        if self.limiter.allow() {
            Ok(())
        } else {
            Err(ApiError::RateLimited)
        }
    }

    /// Call the model and recover a JSON object from its output.
    async fn generate_object(&self, prompt: &str) -> Result<JsonObject, ApiError> {
        let raw = self.model.generate(prompt).await.map_err(|e| {
            log::error!("Model call failed: {e}");
            ApiError::Upstream
        })?;

        extract_json_object(&raw).ok_or_else(|| {
            let cut = raw
                .char_indices()
                .nth(RAW_LOG_LIMIT)
                .map_or(raw.len(), |(i, _)| i);
            log::error!("Failed to parse JSON. Raw response: {}", &raw[..cut]);
            ApiError::Parse
        })
    }

    /// Best-effort write of an upload; failures never fail the request.
    async fn persist(&self, file: &UploadedFile, fallback_name: &str) {
        let Some(store) = &self.uploads else {
            return;
        };
        let name = file.filename.as_deref().unwrap_or(fallback_name);
        match store.save(&file.bytes, name).await {
            Ok(stored) => log::info!("Stored upload at {}", stored.file_url),
            Err(e) => log::warn!("Could not store upload {name}: {e}"),
        }
    }
}

/// MIME type to send to the transcription model for a browser-reported
/// content type.  Parameters such as `;codecs=opus` are ignored.
pub fn transcription_mime(content_type: Option<&str>) -> &str {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_AUDIO_MIME);

    match essence {
        "audio/mpeg" => "audio/mp3",
        "audio/x-m4a" => "audio/mp4",
        "audio/webm" | "video/webm" => "audio/wav",
        other => other,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
