//! Permissive recovery of a JSON object from model output.
//!
//! Models are asked for bare JSON but often wrap it in markdown fences or
//! surround it with commentary.  [`extract_json_object`] tries, in order,
//! stopping at the first success:
//!
//! 1. the whole blob;
//! 2. the first fenced code block (optionally tagged `json`) holding `{…}`;
//! 3. the first non-greedy `{…}` anywhere;
//! 4. balanced `{…}` spans found by depth counting, in order of their
//!    opening brace.  Quotes and escapes are tracked so braces inside JSON
//!    strings do not move the depth.  At most [`MAX_SCAN_STARTS`] opening
//!    braces are tried.
//!
//! Only a non-empty JSON object counts as recovered.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::types::JsonObject;

fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced block pattern is valid")
    })
}

fn lazy_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*?\}").expect("object pattern is valid"))
}

/// Recover the JSON object embedded in `raw`, or `None` when every strategy
/// fails.
pub fn extract_json_object(raw: &str) -> Option<JsonObject> {
    if let Some(obj) = parse_object(raw.trim()) {
        return Some(obj);
    }

    if let Some(obj) = fenced_block_re()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_object(m.as_str()))
    {
        log::debug!("Recovered JSON from fenced code block");
        return Some(obj);
    }

    if let Some(obj) = lazy_object_re()
        .find(raw)
        .and_then(|m| parse_object(m.as_str()))
    {
        log::debug!("Recovered JSON from first brace pair");
        return Some(obj);
    }

    let recovered = BalancedObjects::new(raw).find_map(parse_object);
    if recovered.is_some() {
        log::debug!("Recovered JSON by brace depth scan");
    }
    recovered
}

fn parse_object(candidate: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(candidate).ok()? {
        Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// BalancedObjects
// ---------------------------------------------------------------------------

/// Opening braces the depth scan will try before giving up.  Each attempt
/// walks to the end of the text in the worst case, so the scan is bounded
/// by `MAX_SCAN_STARTS * len` rather than `len²`.
pub const MAX_SCAN_STARTS: usize = 64;

/// Iterator over balanced brace spans, one per opening brace that starts a
/// span, scanning left to right.
struct BalancedObjects<'a> {
    text: &'a str,
    pos: usize,
    starts: usize,
}

impl<'a> BalancedObjects<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0, starts: 0 }
    }
}

impl<'a> Iterator for BalancedObjects<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while self.pos < self.text.len() {
            if self.starts == MAX_SCAN_STARTS {
                log::debug!("Depth scan gave up after {MAX_SCAN_STARTS} opening braces");
                return None;
            }
            let start = self.pos + self.text[self.pos..].find('{')?;
            self.pos = start + 1;
            self.starts += 1;
            if let Some(end) = balanced_end(&self.text[start..]) {
                return Some(&self.text[start..start + end]);
            }
        }
        None
    }
}

/// Byte length of the balanced object starting at `s[0] == '{'`.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn label(obj: &JsonObject) -> &str {
        obj["sarcasm_label"].as_str().unwrap()
    }

    #[test]
    fn parses_bare_json() {
        let obj = extract_json_object(r#"  {"sarcasm_label": "sarcastic"}  "#).unwrap();
        assert_eq!(label(&obj), "sarcastic");
    }

    #[test]
    fn parses_fenced_block_with_and_without_tag() {
        let tagged = "Here you go:\n```json\n{\"sarcasm_label\": \"sarcastic\"}\n```\nCheers";
        let untagged = "```\n{\"sarcasm_label\": \"not_sarcastic\"}\n```";
        assert_eq!(label(&extract_json_object(tagged).unwrap()), "sarcastic");
        assert_eq!(label(&extract_json_object(untagged).unwrap()), "not_sarcastic");
    }

    #[test]
    fn fenced_block_keeps_nested_objects() {
        let raw = "```json\n{\"emotions\": [{\"label\": \"joy\", \"prob\": 0.4}], \"sarcasm_label\": \"sarcastic\"}\n```";
        let obj = extract_json_object(raw).unwrap();
        assert_eq!(obj["emotions"], json!([{"label": "joy", "prob": 0.4}]));
    }

    #[test]
    fn parses_object_surrounded_by_prose() {
        let raw = "Sure! {\"sarcasm_label\": \"sarcastic\", \"risk_score\": 3} Let me know.";
        let obj = extract_json_object(raw).unwrap();
        assert_eq!(label(&obj), "sarcastic");
        assert_eq!(obj["risk_score"], 3);
    }

    #[test]
    fn nested_braces_need_depth_scan() {
        let raw = concat!(
            "Analysis follows. ",
            r#"{"sarcasm_label": "sarcastic", "explanation": "quotes {air} around words", "#,
            r#""emotions": [{"label": "contempt", "prob": 0.7}]}"#,
            " Hope this helps {ok}"
        );
        // The regex strategies truncate at the first closing brace.
        assert!(lazy_object_re()
            .find(raw)
            .and_then(|m| parse_object(m.as_str()))
            .is_none());

        let obj = extract_json_object(raw).unwrap();
        assert_eq!(label(&obj), "sarcastic");
        assert_eq!(obj["explanation"], "quotes {air} around words");
        assert_eq!(obj["emotions"][0]["label"], "contempt");
    }

    #[test]
    fn unbalanced_brace_inside_string_is_ignored() {
        let raw = r#"Result: {"sarcasm_label": "sarcastic", "explanation": "a lone } brace", "highlights": ["x"]} done"#;
        let obj = extract_json_object(raw).unwrap();
        assert_eq!(obj["explanation"], "a lone } brace");
        assert_eq!(obj["highlights"], json!(["x"]));
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let raw = r#"note {"explanation": "she said \"{fine}\"", "sarcasm_label": "sarcastic", "x": {"y": 1}} end"#;
        let obj = extract_json_object(raw).unwrap();
        assert_eq!(obj["explanation"], "she said \"{fine}\"");
    }

    #[test]
    fn skips_brace_spans_that_are_not_json() {
        let raw = r#"The {placeholder} is wrong; real answer: {"sarcasm_label": "sarcastic", "meta": {"v": 1}}"#;
        let obj = extract_json_object(raw).unwrap();
        assert_eq!(label(&obj), "sarcastic");
    }

    #[test]
    fn failure_cases_return_none() {
        assert!(extract_json_object("").is_none());
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("{ not json").is_none());
        assert!(extract_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("{}").is_none());
    }

    #[test]
    fn balanced_spans_in_order() {
        let spans: Vec<&str> = BalancedObjects::new("a {b {c}} d {e}").collect();
        assert_eq!(spans, vec!["{b {c}}", "{c}", "{e}"]);
        assert_eq!(BalancedObjects::new("a {b").next(), None);
        assert_eq!(BalancedObjects::new("no braces").next(), None);
    }

    #[test]
    fn depth_scan_stops_after_max_starts() {
        // Every leading brace is unclosed, so each one is a failed start.
        let within = format!("{}{{\"sarcasm_label\": \"sarcastic\"}}", "{".repeat(MAX_SCAN_STARTS - 1));
        let beyond = format!("{}{{\"sarcasm_label\": \"sarcastic\"}}", "{".repeat(MAX_SCAN_STARTS));

        assert_eq!(
            BalancedObjects::new(&within).next(),
            Some(r#"{"sarcasm_label": "sarcastic"}"#)
        );
        assert_eq!(BalancedObjects::new(&beyond).next(), None);
        assert!(extract_json_object(&beyond).is_none());
    }

    #[test]
    fn unclosed_brace_flood_terminates() {
        let raw = "{ ".repeat(50_000);
        assert!(extract_json_object(&raw).is_none());
    }
}
