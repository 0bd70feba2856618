//! Provider response envelopes.
//!
//! The model's generated text arrives wrapped in a provider-specific JSON
//! structure.  [`Envelope::from_value`] classifies a decoded body into one of
//! the known layouts and [`Envelope::into_text`] yields the text inside it.

use serde_json::Value;

/// Known response layouts, most specific first.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Gemini: `candidates[0].content.parts[0].text`, `candidates[0].text`,
    /// or a bare string at `candidates[0]`.
    Candidates(String),
    /// A flat `text`, `output` or `result` string field.
    Flat(String),
    /// OpenAI completions: `choices[0].text` or a bare string at `choices[0]`.
    Choices(String),
    /// Anything else, rendered as text.
    Raw(String),
}

impl Envelope {
    pub fn from_value(data: &Value) -> Self {
        if let Some(text) = candidates_text(data) {
            return Envelope::Candidates(text.to_string());
        }
        if let Some(text) = ["text", "output", "result"]
            .iter()
            .find_map(|key| data.get(*key).and_then(Value::as_str))
        {
            return Envelope::Flat(text.to_string());
        }
        if let Some(text) = choices_text(data) {
            return Envelope::Choices(text.to_string());
        }
        Envelope::Raw(raw_text(data))
    }

    pub fn into_text(self) -> String {
        match self {
            Envelope::Candidates(t) | Envelope::Flat(t) | Envelope::Choices(t) | Envelope::Raw(t) => t,
        }
    }

    /// Short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Candidates(_) => "candidates",
            Envelope::Flat(_) => "flat",
            Envelope::Choices(_) => "choices",
            Envelope::Raw(_) => "raw",
        }
    }
}

fn candidates_text(data: &Value) -> Option<&str> {
    let first = data.get("candidates")?.as_array()?.first()?;
    if let Some(s) = first.as_str() {
        return Some(s);
    }
    let from_parts = first
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());
    from_parts.or_else(|| first.get("text").and_then(Value::as_str))
}

fn choices_text(data: &Value) -> Option<&str> {
    let first = data.get("choices")?.as_array()?.first()?;
    first
        .as_str()
        .or_else(|| first.get("text").and_then(Value::as_str))
}

fn raw_text(data: &Value) -> String {
    match data {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_of(data: &Value) -> String {
        Envelope::from_value(data).into_text()
    }

    #[test]
    fn gemini_parts_text() {
        let data = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":1}"}], "role": "model"}}]
        });
        assert_eq!(
            Envelope::from_value(&data),
            Envelope::Candidates("{\"a\":1}".into())
        );
    }

    #[test]
    fn gemini_candidate_direct_text_and_string() {
        let direct = json!({"candidates": [{"text": "direct"}]});
        let bare = json!({"candidates": ["bare"]});
        assert_eq!(text_of(&direct), "direct");
        assert_eq!(text_of(&bare), "bare");
    }

    #[test]
    fn empty_parts_text_falls_back_to_candidate_text() {
        let data = json!({"candidates": [{"content": {"parts": [{"text": ""}]}, "text": "fallback"}]});
        assert_eq!(text_of(&data), "fallback");
    }

    #[test]
    fn flat_fields_in_priority_order() {
        assert_eq!(
            Envelope::from_value(&json!({"output": "o", "result": "r"})),
            Envelope::Flat("o".into())
        );
        assert_eq!(text_of(&json!({"result": "r"})), "r");
        // Non-string values are not flat text.
        assert_eq!(
            Envelope::from_value(&json!({"text": 5})).kind(),
            "raw"
        );
    }

    #[test]
    fn openai_choices() {
        assert_eq!(
            Envelope::from_value(&json!({"choices": [{"text": "c"}]})),
            Envelope::Choices("c".into())
        );
        assert_eq!(text_of(&json!({"choices": ["s"]})), "s");
    }

    #[test]
    fn unknown_shapes_render_as_raw() {
        assert_eq!(text_of(&Value::Null), "");
        assert_eq!(text_of(&json!("plain")), "plain");
        assert_eq!(text_of(&json!({"candidates": []})), "{\"candidates\":[]}");
        assert_eq!(text_of(&json!([1, 2])), "[1,2]");
    }
}
