//! Moderation error types.
//!
//! Every failure in the pipeline is returned as a [`ModerationError`] value;
//! nothing in the core unwinds. The variants follow the request lifecycle:
//!
//! | Variant                 | Raised by                 | Surfaced as |
//! |-------------------------|---------------------------|-------------|
//! | `Validation`            | `RequestValidator`        | 400         |
//! | `ClassifierUnavailable` | classifier load (startup) | fatal       |
//! | `Classification`        | classifier call, decision | 500         |
//! | `ClassifierTimeout`     | deadline on classifier    | 500         |
//! | `Config`                | config load               | fatal       |
//! | `Unexpected`            | internals                 | 500         |
//!
//! Callers outside the crate see [`ModerationError::code`], a stable string
//! that never carries internal detail. The `Display` text is meant for logs.

use std::time::Duration;

use thiserror::Error;

/// Moderation pipeline errors.
#[derive(Error, Debug)]
pub enum ModerationError {
    /// The request failed structural or semantic validation.
    ///
    /// The payload is the human-readable reason and is safe to return to callers.
    #[error("{0}")]
    Validation(String),

    /// The classifier could not be loaded at startup.
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// The classifier call failed or returned an unusable vector.
    #[error("Classification error: {0}")]
    Classification(String),

    /// The classifier call exceeded its deadline.
    #[error("Classification timed out after {}ms", .0.as_millis())]
    ClassifierTimeout(Duration),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Anything else.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Result type alias for moderation operations
pub type Result<T> = std::result::Result<T, ModerationError>;

impl ModerationError {
    /// Stable, sanitized error code for external callers.
    pub fn code(&self) -> &'static str {
        match self {
            ModerationError::Validation(_) => "VALIDATION_FAILED",
            ModerationError::ClassifierUnavailable(_) => "CLASSIFIER_UNAVAILABLE",
            ModerationError::Classification(_) => "CLASSIFICATION_FAILED",
            ModerationError::ClassifierTimeout(_) => "CLASSIFICATION_TIMEOUT",
            ModerationError::Config(_) => "CONFIGURATION_ERROR",
            ModerationError::Unexpected(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure was caused by the request itself.
    pub fn is_validation(&self) -> bool {
        matches!(self, ModerationError::Validation(_))
    }

    /// Build a validation error from anything string-like.
    pub fn validation(reason: impl Into<String>) -> Self {
        ModerationError::Validation(reason.into())
    }
}

impl From<toml::de::Error> for ModerationError {
    fn from(err: toml::de::Error) -> Self {
        ModerationError::Config(format!("Failed to parse config: {err}"))
    }
}

impl From<tokio::task::JoinError> for ModerationError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            ModerationError::Classification("classifier task panicked".to_string())
        } else {
            ModerationError::Unexpected(format!("classifier task cancelled: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_is_reason() {
        let err = ModerationError::validation("Missing 'content' section");
        assert_eq!(err.to_string(), "Missing 'content' section");
        assert!(err.is_validation());
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_codes_are_sanitized() {
        let err = ModerationError::Unexpected("db password=hunter2 leaked".to_string());
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(!err.is_validation());

        let err = ModerationError::ClassifierTimeout(Duration::from_millis(250));
        assert_eq!(err.code(), "CLASSIFICATION_TIMEOUT");
        assert_eq!(err.to_string(), "Classification timed out after 250ms");
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let err: ModerationError = toml::from_str::<toml::Value>("= broken")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }
}
