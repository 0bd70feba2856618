//! Prompt builder for sarcasm analysis.
//!
//! [`PromptBuilder`] assembles a single flat prompt string for Gemini's
//! `generateContent` endpoint.  Every prompt starts with a fixed system
//! instruction demanding a strict JSON object, followed by a modality-specific
//! body (text, voice transcript, or image OCR text).
//!
//! The [`Domain`] is selected per request from the `X-Domain` header.
//! `social_media` strips `#`/`@` from text input and embeds few-shot examples
//! of ironic versus genuine posts; any other value falls back to the default
//! template.

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

/// Asks for the six schema keys and nothing else.
pub const SYSTEM_INSTRUCTION: &str = "\
Analyze the following text for sarcasm and tone. Return ONLY a valid JSON object, nothing else. No explanation, no markdown, no extra text.

The JSON must have exactly these keys:
{
  \"sarcasm_label\": \"sarcastic\" or \"not_sarcastic\",
  \"sarcasm_intensity\": 0-100,
  \"emotions\": [{\"label\": \"emotion_name\", \"prob\": 0.0-1.0}],
  \"risk_score\": 0-100,
  \"highlights\": [\"phrase1\", \"phrase2\"],
  \"explanation\": \"brief explanation in 1-2 sentences\"
}";

// ---------------------------------------------------------------------------
// Few-shot examples
// ---------------------------------------------------------------------------

const SOCIAL_MEDIA_EXAMPLES: &str = "\
Examples:
1. \"Wow, another Monday morning. Just what I needed to start my week off perfectly. #Blessed #LivingTheDream\"
   Sarcasm: High intensity, Explanation: Overly positive language and hashtags used ironically to express annoyance.
2. \"Best coffee ever! #Amazing #Blessed\"
   Sarcasm: None, Explanation: Genuine positive sentiment expressed through hashtags and adjectives.
3. \"Sure, because staying late at work is my favorite thing to do. #WorkLife #Goals\"
   Sarcasm: High intensity, Explanation: Irony in expressing enjoyment of staying late at work.
4. \"Had a great time at the party last night! 🎉 #FunTimes\"
   Sarcasm: None, Explanation: Genuine excitement and positive sentiment conveyed through emojis and hashtags.
5. \"Oh, fantastic! Another software update that breaks everything. #TechLife\"
   Sarcasm: High intensity, Explanation: Sarcasm in expressing frustration with software updates.
";

/// Number of trailing context entries embedded in a text prompt.
pub const MAX_CONTEXT_LINES: usize = 3;

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// Named prompt / post-processing variant, selected by the `X-Domain` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    /// General language analysis.
    #[default]
    Default,
    /// Tweets, posts, memes and DMs.
    SocialMedia,
}

impl Domain {
    /// Header token selecting [`Domain::SocialMedia`].
    pub const SOCIAL_MEDIA_TOKEN: &'static str = "social_media";

    /// Map an `X-Domain` header value to a domain.  Anything other than the
    /// exact social-media token (including a missing header) is `Default`.
    ///
    /// ```
    /// use sarcasm_detect::llm::Domain;
    ///
    /// assert_eq!(Domain::from_header(Some("social_media")), Domain::SocialMedia);
    /// assert_eq!(Domain::from_header(Some("news")), Domain::Default);
    /// assert_eq!(Domain::from_header(None), Domain::Default);
    /// ```
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(Self::SOCIAL_MEDIA_TOKEN) => Domain::SocialMedia,
            _ => Domain::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Default => "default",
            Domain::SocialMedia => Self::SOCIAL_MEDIA_TOKEN,
        }
    }
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds sarcasm-analysis prompts for one [`Domain`].
///
/// # Example
/// ```rust
/// use sarcasm_detect::llm::{Domain, PromptBuilder};
///
/// let builder = PromptBuilder::new(Domain::SocialMedia);
/// let prompt = builder.text_prompt("Wow, another Monday! #Blessed", &[]);
/// assert!(prompt.contains("Wow, another Monday! Blessed"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    domain: Domain,
}

impl PromptBuilder {
    pub fn new(domain: Domain) -> Self {
        Self { domain }
    }

    /// Prompt for free text plus prior conversation context.
    ///
    /// Only the last [`MAX_CONTEXT_LINES`] entries of `context` are used.
    pub fn text_prompt(&self, text: &str, context: &[String]) -> String {
        let context_snippet = context_snippet(context);
        let mut prompt = String::with_capacity(2048);
        prompt.push_str(SYSTEM_INSTRUCTION);
        prompt.push_str("\n\n");

        match self.domain {
            Domain::Default => {
                prompt.push_str(
                    "Analyze the following text for sarcasm and tone. \
                     Focus on general language analysis without domain-specific elements. ",
                );
                prompt.push_str(&format!(
                    "Text: \"{}\"\nContext: \"{}\"\nReturn JSON.",
                    text, context_snippet
                ));
            }
            Domain::SocialMedia => {
                let processed = strip_social_markers(text);
                prompt.push_str(
                    "Analyze the following text in the context of social media. \
                     Consider hashtags, emojis, informal expressions, and the tone typical of social media posts. \
                     Provide an explanation that references these elements explicitly. ",
                );
                prompt.push_str(SOCIAL_MEDIA_EXAMPLES);
                prompt.push_str(&format!(
                    "Text: \"{}\"\nContext: \"{}\"\n",
                    processed, context_snippet
                ));
                prompt.push_str(
                    "Return JSON with keys: sarcasm_label, sarcasm_intensity, emotions, risk_score, highlights, explanation.",
                );
            }
        }
        prompt
    }

    /// Prompt for a voice transcript with optional acoustic notes.
    pub fn voice_prompt(&self, transcript: &str, acoustic_notes: Option<&str>) -> String {
        format!(
            "{}\n\nTranscript: \"{}\"\nAcoustic notes: \"{}\"\nReturn JSON.",
            SYSTEM_INSTRUCTION,
            transcript,
            acoustic_notes.unwrap_or("")
        )
    }

    /// Prompt for text recognised in an image, with an optional caption.
    pub fn image_prompt(&self, ocr_text: &str, image_caption: Option<&str>) -> String {
        let caption = image_caption.unwrap_or("");
        match self.domain {
            Domain::Default => format!(
                "{}\n\nOCR text: \"{}\"\nImage caption: \"{}\"\nReturn JSON.",
                SYSTEM_INSTRUCTION, ocr_text, caption
            ),
            Domain::SocialMedia => format!(
                "{}\n\nAnalyze the following OCR text as social media content (memes, screenshots, DMs). \
                 Account for sarcasm cues like hashtags, emojis, and exaggerated slang.\
                 \nOCR text: \"{}\"\nImage caption/context: \"{}\"\
                 \nReturn JSON with sarcasm_label, sarcasm_intensity, emotions, risk_score, highlights, explanation.",
                SYSTEM_INSTRUCTION, ocr_text, caption
            ),
        }
    }
}

/// Remove hashtag and mention markers, keeping the words themselves.
pub fn strip_social_markers(text: &str) -> String {
    text.chars().filter(|c| *c != '#' && *c != '@').collect()
}

fn context_snippet(context: &[String]) -> String {
    let start = context.len().saturating_sub(MAX_CONTEXT_LINES);
    context[start..].join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_prompt_starts_with_system_instruction() {
        for domain in [Domain::Default, Domain::SocialMedia] {
            let builder = PromptBuilder::new(domain);
            assert!(builder.text_prompt("hi", &[]).starts_with(SYSTEM_INSTRUCTION));
            assert!(builder.voice_prompt("hi", None).starts_with(SYSTEM_INSTRUCTION));
            assert!(builder.image_prompt("hi", None).starts_with(SYSTEM_INSTRUCTION));
        }
    }

    #[test]
    fn default_text_prompt_embeds_text_and_context() {
        let builder = PromptBuilder::new(Domain::Default);
        let prompt = builder.text_prompt("Great, more rain.", &ctx(&["It rained all week."]));

        assert!(prompt.contains("Text: \"Great, more rain.\""));
        assert!(prompt.contains("Context: \"It rained all week.\""));
        assert!(prompt.ends_with("Return JSON."));
        assert!(!prompt.contains("Examples:"));
    }

    #[test]
    fn only_last_three_context_lines_are_used() {
        let builder = PromptBuilder::new(Domain::Default);
        let prompt = builder.text_prompt("x", &ctx(&["ctx-1", "ctx-2", "ctx-3", "ctx-4"]));

        assert!(!prompt.contains("ctx-1"));
        assert!(prompt.contains("Context: \"ctx-2\nctx-3\nctx-4\""));
    }

    #[test]
    fn empty_context_renders_empty_quotes() {
        let builder = PromptBuilder::new(Domain::Default);
        let prompt = builder.text_prompt("x", &[]);
        assert!(prompt.contains("Context: \"\""));
    }

    #[test]
    fn social_media_strips_hashes_and_mentions() {
        let builder = PromptBuilder::new(Domain::SocialMedia);
        let prompt = builder.text_prompt("Wow, another Monday! #Blessed @boss", &[]);

        assert!(prompt.contains("Text: \"Wow, another Monday! Blessed boss\""));
        assert!(!prompt.contains("#Blessed @boss"));
    }

    #[test]
    fn social_media_embeds_five_examples() {
        let builder = PromptBuilder::new(Domain::SocialMedia);
        let prompt = builder.text_prompt("x", &[]);

        assert!(prompt.contains("Examples:"));
        for n in 1..=5 {
            assert!(prompt.contains(&format!("\n{n}. \"")), "missing example {n}");
        }
        assert!(prompt.contains("Return JSON with keys:"));
    }

    #[test]
    fn voice_prompt_includes_notes_or_empty() {
        let builder = PromptBuilder::new(Domain::Default);
        let with = builder.voice_prompt("oh great", Some("flat tone"));
        let without = builder.voice_prompt("oh great", None);

        assert!(with.contains("Transcript: \"oh great\"\nAcoustic notes: \"flat tone\""));
        assert!(without.contains("Acoustic notes: \"\""));
    }

    #[test]
    fn image_prompt_varies_by_domain() {
        let default = PromptBuilder::new(Domain::Default).image_prompt("LOL ok", Some("meme"));
        let social = PromptBuilder::new(Domain::SocialMedia).image_prompt("LOL ok", Some("meme"));

        assert!(default.contains("OCR text: \"LOL ok\"\nImage caption: \"meme\""));
        assert!(social.contains("memes, screenshots, DMs"));
        assert!(social.contains("Image caption/context: \"meme\""));
    }

    #[test]
    fn domain_header_parsing() {
        assert_eq!(Domain::from_header(Some("social_media")), Domain::SocialMedia);
        assert_eq!(Domain::from_header(Some("Social_Media")), Domain::Default);
        assert_eq!(Domain::from_header(Some("default")), Domain::Default);
        assert_eq!(Domain::from_header(None), Domain::Default);
    }
}
