//! Annotation records: one classified abstract each.

use crate::schema;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// The structured result of classifying a single abstract.
///
/// Holds the model-produced values keyed by schema field name, or an error
/// marker when the call or the response parse failed. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    values: BTreeMap<String, String>,
    error: Option<String>,
}

impl AnnotationRecord {
    /// Build a record from a parsed JSON object, keeping only schema fields.
    ///
    /// Scalar values are stored in their trimmed textual form, so `1` and
    /// `"1"` land as the same cell value. Missing keys stay missing.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let mut values = BTreeMap::new();
        for field in schema::ANNOTATION_FIELDS {
            if let Some(value) = object.get(field.name) {
                if let Some(text) = scalar_to_string(value) {
                    values.insert(field.name.to_string(), text);
                }
            }
        }
        Self { values, error: None }
    }

    /// Build an error-marker record for a failed call or parse.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            values: BTreeMap::new(),
            error: Some(message.into()),
        }
    }

    /// The value for a field, if the model produced one.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// The error marker, if this record represents a failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Render as a JSON object for display (sample mode).
    pub fn to_json(&self) -> Value {
        if let Some(err) = &self.error {
            return json!({ "error": err });
        }
        let mut object = Map::new();
        for field in schema::ANNOTATION_FIELDS {
            if let Some(value) = self.values.get(field.name) {
                object.insert(field.name.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(object)
    }
}

/// Textual form of a scalar JSON value; `None` for arrays, objects, null.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(json: Value) -> Map<String, Value> {
        json.as_object().unwrap().clone()
    }

    #[test]
    fn test_from_json_keeps_schema_fields() {
        let record = AnnotationRecord::from_json(&object(json!({
            "aging_related": 1,
            "theoretical_conceptual": "0",
            "review_type": 0,
            "country": " CHINA ",
            "unrelated_key": "dropped",
        })));
        assert_eq!(record.get("aging_related"), Some("1"));
        assert_eq!(record.get("theoretical_conceptual"), Some("0"));
        assert_eq!(record.get("country"), Some("CHINA"));
        assert_eq!(record.get("unrelated_key"), None);
        assert!(!record.is_error());
    }

    #[test]
    fn test_number_and_string_forms_agree() {
        let from_number = AnnotationRecord::from_json(&object(json!({"aging_related": 1})));
        let from_string = AnnotationRecord::from_json(&object(json!({"aging_related": "1"})));
        assert_eq!(from_number.get("aging_related"), from_string.get("aging_related"));
    }

    #[test]
    fn test_missing_key_is_missing() {
        let record = AnnotationRecord::from_json(&object(json!({"aging_related": 1})));
        assert_eq!(record.get("country"), None);
    }

    #[test]
    fn test_error_record() {
        let record = AnnotationRecord::from_error("An error occurred: timeout");
        assert!(record.is_error());
        assert_eq!(record.error(), Some("An error occurred: timeout"));
        assert_eq!(record.get("aging_related"), None);
        assert_eq!(record.to_json()["error"], "An error occurred: timeout");
    }

    #[test]
    fn test_to_json_round_trip() {
        let record = AnnotationRecord::from_json(&object(json!({
            "aging_related": 1,
            "country": "NA",
        })));
        let rendered = record.to_json();
        assert_eq!(rendered["aging_related"], "1");
        assert_eq!(rendered["country"], "NA");
    }
}
