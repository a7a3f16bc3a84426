//! Response normalization for raw model output
//!
//! Turns untrusted backend text into a `CommitCandidate` or a
//! classified failure. Pure functions, no side effects; rule checks
//! belong to the validator, not here.

use crate::types::CommitCandidate;
use serde_json::Value;

/// Normalization failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    /// Response is not decodable as a flat JSON object
    InvalidJson,
    /// Decodable, but a present field has the wrong shape
    InvalidSchema,
}

/// Strip markdown code fences from a response without requiring them.
pub fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = if trimmed.starts_with("```json") {
        trimmed.strip_prefix("```json").unwrap_or(trimmed)
    } else if trimmed.starts_with("```") {
        trimmed.strip_prefix("```").unwrap_or(trimmed)
    } else {
        trimmed
    };
    let clean = if clean.ends_with("```") {
        clean.strip_suffix("```").unwrap_or(clean)
    } else {
        clean
    };
    clean.trim()
}

/// Pull one optional text field out of a decoded object.
///
/// Absent and `null` fields become `None`; any other non-string value
/// fails the whole object.
fn text_field(object: &serde_json::Map<String, Value>, key: &str) -> Result<Option<String>, NormalizeError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(NormalizeError::InvalidSchema),
    }
}

/// Normalize raw backend text into a structured candidate.
///
/// `word_count` is left unset; populating it is the validator's job.
pub fn normalize_response(raw: &str) -> Result<CommitCandidate, NormalizeError> {
    let cleaned = strip_markdown_fences(raw);
    let value: Value = serde_json::from_str(cleaned).map_err(|_| NormalizeError::InvalidJson)?;
    let object = value.as_object().ok_or(NormalizeError::InvalidJson)?;

    Ok(CommitCandidate {
        kind: text_field(object, "type")?,
        scope: text_field(object, "scope")?,
        subject: text_field(object, "subject")?,
        body: text_field(object, "body")?,
        word_count: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence_pair() {
        let raw = " ```json\n{\"subject\":\"add cache\"}\n``` ";
        let candidate = normalize_response(raw).unwrap();
        assert_eq!(candidate.subject.as_deref(), Some("add cache"));
        assert!(candidate.body.is_none());
        assert!(candidate.kind.is_none());
        assert!(candidate.scope.is_none());
        assert!(candidate.word_count.is_none());
    }

    #[test]
    fn accepts_bare_object_without_fences() {
        let candidate =
            normalize_response(r#"{"type":"fix","scope":"parser","subject":"s","body":"b"}"#)
                .unwrap();
        assert_eq!(candidate.kind.as_deref(), Some("fix"));
        assert_eq!(candidate.scope.as_deref(), Some("parser"));
        assert_eq!(candidate.body.as_deref(), Some("b"));
    }

    #[test]
    fn non_json_is_invalid_json() {
        assert_eq!(
            normalize_response("here is your commit message").unwrap_err(),
            NormalizeError::InvalidJson
        );
    }

    #[test]
    fn non_object_root_is_invalid_json() {
        assert_eq!(
            normalize_response(r#"["subject"]"#).unwrap_err(),
            NormalizeError::InvalidJson
        );
        assert_eq!(
            normalize_response("\"just a string\"").unwrap_err(),
            NormalizeError::InvalidJson
        );
    }

    #[test]
    fn wrong_field_shape_is_invalid_schema() {
        assert_eq!(
            normalize_response(r#"{"subject": 42}"#).unwrap_err(),
            NormalizeError::InvalidSchema
        );
        assert_eq!(
            normalize_response(r#"{"subject": "ok", "body": ["x"]}"#).unwrap_err(),
            NormalizeError::InvalidSchema
        );
    }

    #[test]
    fn null_fields_are_treated_as_absent() {
        let candidate = normalize_response(r#"{"subject":"s","body":null,"type":null}"#).unwrap();
        assert_eq!(candidate.subject.as_deref(), Some("s"));
        assert!(candidate.body.is_none());
        assert!(candidate.kind.is_none());
    }

    #[test]
    fn fence_without_language_tag_is_stripped() {
        let candidate = normalize_response("```\n{\"subject\":\"s\"}\n```").unwrap();
        assert_eq!(candidate.subject.as_deref(), Some("s"));
    }
}
