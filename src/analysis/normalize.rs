//! Coercion of a recovered JSON object into the fixed result schema.
//!
//! Upstream fields may be native JSON values or JSON-encoded strings, and
//! may be missing or malformed.  Nothing here fails: each field degrades to
//! its default.
//!
//! | Field | Default |
//! |-------|---------|
//! | `sarcasm_label` (non-blank string) | `"not_sarcastic"` |
//! | `sarcasm_intensity`, `risk_score` (number / numeric string / bool) | `0` |
//! | `emotions`, `highlights`, `timestamps_explanations`, `attention_regions` | `[]` |
//! | `explanation` (string) | `""` |
//! | `mode_explanation` (string) | `null` |
//! | `offensive_flag` (bool / `"true"` / number) | `false` |
//!
//! List fields accept a list, a JSON-encoded list string, or a single value
//! (wrapped into a one-element list).  A string that does not decode yields
//! the empty list.  Elements of the wrong shape are dropped.

use serde_json::Value;

use super::types::{
    AnalysisResult, Emotion, ImageAnalysisResult, JsonObject, VoiceAnalysisResult, DEFAULT_LABEL,
};

// ---------------------------------------------------------------------------
// Result builders
// ---------------------------------------------------------------------------

/// Build an [`AnalysisResult`] from a recovered object.
pub fn normalize_analysis(obj: &JsonObject) -> AnalysisResult {
    AnalysisResult {
        sarcasm_label: obj
            .get("sarcasm_label")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_LABEL)
            .to_string(),
        sarcasm_intensity: coerce_int(obj.get("sarcasm_intensity")),
        emotions: coerce_emotions(obj.get("emotions")),
        risk_score: coerce_int(obj.get("risk_score")),
        highlights: coerce_highlights(obj.get("highlights")),
        explanation: obj
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        mode_explanation: obj
            .get("mode_explanation")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

pub fn normalize_voice(obj: &JsonObject, transcript: String) -> VoiceAnalysisResult {
    VoiceAnalysisResult {
        analysis: normalize_analysis(obj),
        transcript,
        timestamps_explanations: coerce_objects(obj.get("timestamps_explanations")),
    }
}

pub fn normalize_image(obj: &JsonObject, ocr_text: String) -> ImageAnalysisResult {
    ImageAnalysisResult {
        analysis: normalize_analysis(obj),
        ocr_text,
        offensive_flag: coerce_bool(obj.get("offensive_flag")),
        attention_regions: coerce_objects(obj.get("attention_regions")),
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Best-effort integer: integers as-is, floats and numeric strings
/// truncated toward zero, booleans as 0/1; anything else is 0.
pub fn coerce_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(float_to_int))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
                .unwrap_or(0)
        }
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    // `as` saturates at the i64 bounds.
    f.is_finite().then(|| f.trunc() as i64)
}

/// Best-effort probability, clamped to `0.0..=1.0`.
pub fn coerce_probability(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|f| f.is_finite())
        .map(|f| f.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// Booleans, `"true"`/`"false"` strings (any case), numbers (non-zero is
/// true); anything else is `false`.
pub fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// Coerce a loosely typed list field into its items.
pub fn coerce_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            Ok(decoded) => wrap_single(decoded),
            Err(_) => Vec::new(),
        },
        Some(other) => wrap_single(other.clone()),
    }
}

/// Single values become a one-element list; empty-ish ones become `[]`.
fn wrap_single(value: Value) -> Vec<Value> {
    let empty = match &value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Bool(true) => false,
    };
    if empty {
        Vec::new()
    } else {
        vec![value]
    }
}

pub fn coerce_emotions(value: Option<&Value>) -> Vec<Emotion> {
    coerce_list(value)
        .iter()
        .filter_map(emotion_from_value)
        .collect()
}

fn emotion_from_value(value: &Value) -> Option<Emotion> {
    match value {
        Value::String(label) if !label.trim().is_empty() => Some(Emotion {
            label: label.trim().to_string(),
            probability: 0.0,
        }),
        Value::Object(map) => {
            let label = ["label", "emotion"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(str::trim)
                .filter(|l| !l.is_empty())?;
            let probability = ["prob", "probability", "score"]
                .iter()
                .find_map(|k| map.get(*k))
                .map(|v| coerce_probability(Some(v)))
                .unwrap_or(0.0);
            Some(Emotion {
                label: label.to_string(),
                probability,
            })
        }
        _ => None,
    }
}

pub fn coerce_highlights(value: Option<&Value>) -> Vec<String> {
    coerce_list(value)
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}

/// List of JSON objects; non-object elements are dropped.
pub fn coerce_objects(value: Option<&Value>) -> Vec<JsonObject> {
    coerce_list(value)
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
