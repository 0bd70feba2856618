//! Response normalization: from raw model text to a typed result.
//!
//! * [`extract_json_object`]: recover a JSON object from prose / fences.
//! * [`normalize_analysis`], [`normalize_voice`], [`normalize_image`]:
//!   coerce it into the fixed schema with documented defaults.
//! * [`social`]: social-media label remapping and annotations.
//!
//! ```rust
//! use sarcasm_detect::analysis::{extract_json_object, normalize_analysis};
//!
//! let raw = "Sure!\n```json\n{\"sarcasm_label\": \"sarcastic\", \"highlights\": \"[\\\"a\\\"]\"}\n```";
//! let obj = extract_json_object(raw).unwrap();
//! let result = normalize_analysis(&obj);
//! assert_eq!(result.highlights, vec!["a".to_string()]);
//! ```

pub mod extract;
pub mod normalize;
pub mod social;
pub mod types;

pub use extract::extract_json_object;
pub use normalize::{normalize_analysis, normalize_image, normalize_voice};
pub use types::{
    AnalysisResult, Emotion, ImageAnalysisResult, JsonObject, VoiceAnalysisResult,
};
