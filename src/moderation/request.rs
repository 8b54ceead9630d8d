//! Moderation requests and their validation.
//!
//! Requests arrive as parsed JSON. [`RequestValidator::validate`] checks the
//! raw value and, on success, returns a typed [`ModerationRequest`]; nothing
//! downstream ever looks at the raw JSON again.
//!
//! Checks, in order:
//! 1. `content` section present
//! 2. `content.text` present
//! 3. `configuration.sensitivityLevel`, when given, is `LOW`, `MEDIUM` or `HIGH`
//!
//! Requested categories are never rejected here; unknown codes are dropped
//! later by the category selector.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ModerationError, Result};
use crate::taxonomy::SensitivityLevel;

/// Content block of a request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    /// Text to moderate, exactly as submitted
    pub text: String,
    /// Declared language, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Optional configuration block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Requested category codes (unfiltered; may contain unknown codes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Requested sensitivity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity_level: Option<SensitivityLevel>,
}

/// Optional metadata block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    /// Caller-supplied request id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// A validated moderation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationRequest {
    /// Content block
    pub content: Content,
    /// Configuration block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
    /// Metadata block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RequestMetadata>,
}

impl ModerationRequest {
    /// Build a request for plain text with no configuration or metadata
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: Content {
                text: text.into(),
                language: None,
            },
            configuration: None,
            metadata: None,
        }
    }

    /// Set the caller request id
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.metadata = Some(RequestMetadata {
            request_id: Some(id.into()),
        });
        self
    }

    /// Set the declared language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.content.language = Some(language.into());
        self
    }

    /// Requested categories, if any were given
    pub fn requested_categories(&self) -> Option<&[String]> {
        self.configuration
            .as_ref()
            .and_then(|c| c.categories.as_deref())
    }

    /// Requested sensitivity, if any
    pub fn sensitivity_level(&self) -> Option<SensitivityLevel> {
        self.configuration.as_ref().and_then(|c| c.sensitivity_level)
    }

    /// Caller request id, if any
    pub fn request_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.request_id.as_deref())
    }

    /// Declared language, if any
    pub fn language(&self) -> Option<&str> {
        self.content.language.as_deref()
    }
}

/// Structural and semantic request checks
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator;

impl RequestValidator {
    /// Create validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a parsed request body.
    ///
    /// Never panics on any JSON value; every failure is a
    /// [`ModerationError::Validation`] carrying the reason.
    pub fn validate(&self, body: &Value) -> Result<ModerationRequest> {
        let content = match body.get("content") {
            Some(value) if !value.is_null() => value,
            _ => return Err(ModerationError::validation("Missing 'content' section")),
        };

        let content = parse_content(content)?;
        let configuration = parse_configuration(body.get("configuration"))?;
        let metadata = parse_metadata(body.get("metadata"));

        Ok(ModerationRequest {
            content,
            configuration,
            metadata,
        })
    }
}

fn parse_content(content: &Value) -> Result<Content> {
    let missing_text = || ModerationError::validation("Missing 'text' field in content");

    let fields = content.as_object().ok_or_else(missing_text)?;
    let text = match fields.get("text") {
        None | Some(Value::Null) => return Err(missing_text()),
        Some(Value::String(text)) => text.clone(),
        Some(_) => {
            return Err(ModerationError::validation(
                "'text' field in content must be a string",
            ))
        },
    };

    let language = fields
        .get("language")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Content { text, language })
}

fn parse_configuration(config: Option<&Value>) -> Result<Option<Configuration>> {
    let fields: &Map<String, Value> = match config {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(fields)) => fields,
        Some(_) => {
            return Err(ModerationError::validation(
                "'configuration' section must be an object",
            ))
        },
    };

    // An empty section behaves as if it were absent
    if fields.is_empty() {
        return Ok(None);
    }

    let sensitivity_level = match fields.get("sensitivityLevel") {
        None | Some(Value::Null) => None,
        Some(Value::String(level)) if level.is_empty() => None,
        Some(Value::String(level)) => Some(level.parse::<SensitivityLevel>()?),
        Some(_) => {
            return Err(ModerationError::validation(format!(
                "Invalid sensitivity level. Must be one of {}",
                SensitivityLevel::valid_set()
            )))
        },
    };

    let categories = fields
        .get("categories")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });

    Ok(Some(Configuration {
        categories,
        sensitivity_level,
    }))
}

fn parse_metadata(metadata: Option<&Value>) -> Option<RequestMetadata> {
    let fields = metadata?.as_object()?;
    let request_id = match fields.get("requestId") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };
    Some(RequestMetadata { request_id })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn validate(body: Value) -> Result<ModerationRequest> {
        RequestValidator::new().validate(&body)
    }

    #[test]
    fn test_minimal_request() {
        let request = validate(json!({"content": {"text": "hello"}})).unwrap();
        assert_eq!(request.content.text, "hello");
        assert_eq!(request.language(), None);
        assert!(request.configuration.is_none());
        assert_eq!(request.request_id(), None);
    }

    #[test]
    fn test_full_request() {
        let request = validate(json!({
            "content": {"text": "  Hello  ", "language": "fr"},
            "configuration": {"categories": ["SPAM", 7, "FOO"], "sensitivityLevel": "HIGH"},
            "metadata": {"requestId": "req-42"}
        }))
        .unwrap();

        // Text is kept verbatim
        assert_eq!(request.content.text, "  Hello  ");
        assert_eq!(request.language(), Some("fr"));
        assert_eq!(
            request.requested_categories(),
            Some(&["SPAM".to_string(), "FOO".to_string()][..])
        );
        assert_eq!(request.sensitivity_level(), Some(SensitivityLevel::High));
        assert_eq!(request.request_id(), Some("req-42"));
    }

    #[test]
    fn test_missing_content() {
        let err = validate(json!({"metadata": {}})).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'content' section");

        let err = validate(json!("just a string")).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'content' section");

        let err = validate(json!({"content": null})).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'content' section");
    }

    #[test]
    fn test_missing_text() {
        let err = validate(json!({"content": {"language": "en"}})).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'text' field in content");

        let err = validate(json!({"content": {"text": null}})).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'text' field in content");

        let err = validate(json!({"content": "text"})).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'text' field in content");
    }

    #[test]
    fn test_non_string_text() {
        let err = validate(json!({"content": {"text": 12}})).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "'text' field in content must be a string");
    }

    #[test]
    fn test_empty_text_is_valid() {
        assert!(validate(json!({"content": {"text": ""}})).is_ok());
    }

    #[test]
    fn test_invalid_sensitivity() {
        let err = validate(json!({
            "content": {"text": "x"},
            "configuration": {"sensitivityLevel": "EXTREME"}
        }))
        .unwrap_err();
        assert!(err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("LOW") && msg.contains("MEDIUM") && msg.contains("HIGH"));

        let err = validate(json!({
            "content": {"text": "x"},
            "configuration": {"sensitivityLevel": 3}
        }))
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_empty_sensitivity_is_ignored() {
        let request = validate(json!({
            "content": {"text": "x"},
            "configuration": {"sensitivityLevel": ""}
        }))
        .unwrap();
        assert_eq!(request.sensitivity_level(), None);
    }

    #[test]
    fn test_content_checked_before_configuration() {
        let err = validate(json!({"configuration": {"sensitivityLevel": "EXTREME"}})).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'content' section");
    }

    #[test]
    fn test_configuration_shapes() {
        let request = validate(json!({"content": {"text": "x"}, "configuration": {}})).unwrap();
        assert!(request.configuration.is_none());

        let err = validate(json!({"content": {"text": "x"}, "configuration": [1]})).unwrap_err();
        assert_eq!(err.to_string(), "'configuration' section must be an object");

        // Non-array categories behave as absent
        let request = validate(json!({
            "content": {"text": "x"},
            "configuration": {"categories": "HATE_SPEECH"}
        }))
        .unwrap();
        assert_eq!(request.requested_categories(), None);
    }

    #[test]
    fn test_metadata_shapes() {
        let request = validate(json!({"content": {"text": "x"}, "metadata": {"requestId": 99}})).unwrap();
        assert_eq!(request.request_id(), Some("99"));

        let request = validate(json!({"content": {"text": "x"}, "metadata": {"requestId": [1]}})).unwrap();
        assert_eq!(request.request_id(), None);

        let request = validate(json!({"content": {"text": "x"}, "metadata": "nope"})).unwrap();
        assert!(request.metadata.is_none());
    }

    #[test]
    fn test_builder_helpers() {
        let request = ModerationRequest::from_text("hi")
            .with_request_id("abc")
            .with_language("de");
        assert_eq!(request.request_id(), Some("abc"));
        assert_eq!(request.language(), Some("de"));
    }
}
