//! Extraction of a structured annotation from a raw model response.
//!
//! Responses are expected to be a bare JSON object, but models routinely
//! wrap them in a fenced code block. Parse failures are values, not
//! panics, so a batch run can record the failure and move on.

use crate::record::AnnotationRecord;
use serde_json::Value;

/// A response the parser could not turn into an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    /// The raw response text, kept for the error marker and for debugging.
    pub raw: String,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. Raw response: {}", self.message, self.raw)
    }
}

/// Parse a model response into an [`AnnotationRecord`].
///
/// A ```json fenced block is unwrapped first when present; otherwise the
/// whole response is treated as JSON. The payload must be a JSON object.
pub fn extract_annotation(raw: &str) -> Result<AnnotationRecord, ParseFailure> {
    let payload = unwrap_fenced_json(raw).unwrap_or(raw).trim();

    let value: Value = serde_json::from_str(payload).map_err(|_| ParseFailure {
        message: "Error: Unable to parse JSON".to_string(),
        raw: raw.to_string(),
    })?;

    match value.as_object() {
        Some(object) => Ok(AnnotationRecord::from_json(object)),
        None => Err(ParseFailure {
            message: "Error: response JSON is not an object".to_string(),
            raw: raw.to_string(),
        }),
    }
}

/// The contents of the first ```json fenced block, if any.
fn unwrap_fenced_json(raw: &str) -> Option<&str> {
    let re = regex::Regex::new(r"(?s)```json\s*(.*?)```").ok()?;
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
