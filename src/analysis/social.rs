//! Social-media post-processing of a normalized result.
//!
//! Applied only when the request selected [`Domain::SocialMedia`]:
//! the label is remapped to a post-oriented wording, a sentence about
//! social-media tone is appended to the explanation (once), and a fixed
//! `mode_explanation` names the pipeline variant.  Applying it twice leaves
//! the result unchanged.
//!
//! [`Domain::SocialMedia`]: crate::llm::Domain::SocialMedia

use super::types::AnalysisResult;

/// Which input the social-media pipeline processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Post text sent directly.
    Text,
    /// Text recognised in a screenshot or meme.
    Image,
}

impl Source {
    fn explanation_note(self) -> &'static str {
        match self {
            Source::Text => "This assessment accounts for hashtags, emojis, and informal phrasing typical of social media posts.",
            Source::Image => "Social media pipeline: OCR text is interpreted with meme/post tone (hashtags, emojis, slang).",
        }
    }

    fn mode_explanation(self) -> &'static str {
        match self {
            Source::Text => "Social media pipeline: inputs are preprocessed for hashtags, mentions, and emojis before sarcasm analysis.",
            Source::Image => "Social media image pipeline: OCR output is normalized for hashtags, mentions, and informal phrasing before sarcasm scoring.",
        }
    }
}

/// Post-oriented wording for the model's label; unknown labels pass through.
pub fn remap_label(label: &str) -> &str {
    match label {
        "sarcastic" => "Sarcastic Post",
        "not_sarcastic" => "Neutral Post",
        "highly_sarcastic" => "Highly Sarcastic Post",
        other => other,
    }
}

/// Apply the social-media label map and annotations in place.
pub fn annotate(result: &mut AnalysisResult, source: Source) {
    result.sarcasm_label = remap_label(&result.sarcasm_label).to_string();

    let note = source.explanation_note();
    if !result.explanation.contains(note) {
        let base = result.explanation.trim();
        result.explanation = if base.is_empty() {
            note.to_string()
        } else {
            format!("{base} {note}")
        };
    }

    result.mode_explanation = Some(source.mode_explanation().to_string());
}
