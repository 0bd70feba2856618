//! Outgoing result schema.
//!
//! Every field is always present and correctly typed; [`normalize`] is the
//! only place that builds these from upstream data.
//!
//! [`normalize`]: crate::analysis::normalize

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded JSON object.
pub type JsonObject = Map<String, Value>;

/// Label used when the model gives none.
pub const DEFAULT_LABEL: &str = "not_sarcastic";

/// One detected emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub label: String,
    /// Probability in `0.0..=1.0`.
    #[serde(rename = "prob")]
    pub probability: f64,
}

/// Sarcasm classification of a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sarcasm_label: String,
    pub sarcasm_intensity: i64,
    pub emotions: Vec<Emotion>,
    pub risk_score: i64,
    pub highlights: Vec<String>,
    pub explanation: String,
    /// Describes the pipeline variant; `null` for the default pipeline.
    pub mode_explanation: Option<String>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            sarcasm_label: DEFAULT_LABEL.into(),
            sarcasm_intensity: 0,
            emotions: Vec::new(),
            risk_score: 0,
            highlights: Vec::new(),
            explanation: String::new(),
            mode_explanation: None,
        }
    }
}

/// Analysis of a voice clip or supplied transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceAnalysisResult {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub transcript: String,
    pub timestamps_explanations: Vec<JsonObject>,
}

/// Analysis of the text found in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysisResult {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub ocr_text: String,
    pub offensive_flag: bool,
    pub attention_regions: Vec<JsonObject>,
}
