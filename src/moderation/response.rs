//! Response envelopes.
//!
//! Success responses have this shape:
//!
//! ```json
//! {
//!   "status": "SUCCESS",
//!   "requestId": "req-1",
//!   "timestamp": "2024-01-01T00:00:00.000Z",
//!   "processingTime": 3,
//!   "result": {
//!     "decision": "ACCEPTED",
//!     "confidence": 0.95,
//!     "analysis": {
//!       "language": "en",
//!       "toxicity": 0.05,
//!       "categories": {
//!         "HATE_SPEECH": {"score": 0.05, "verdict": "ACCEPTED", "violations": []}
//!       }
//!     },
//!     "metadata": {"processedAt": "2024-01-01T00:00:00.000Z", "modelVersion": "v1.0"}
//!   }
//! }
//! ```
//!
//! Failures use [`ErrorResponse`]. Validation reasons are passed through;
//! every other failure gets a generic message plus a stable error code.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::decision::ModerationResult;
use super::request::ModerationRequest;
use crate::config::{DEFAULT_DISPLAY_THRESHOLD, DEFAULT_MODEL_VERSION};
use crate::error::ModerationError;

/// Language reported when the request declares none
pub const DEFAULT_LANGUAGE: &str = "en";

/// Request id reported when the request carries none
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

/// Message returned for any non-validation failure
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing the request";

/// Source of the response timestamp
pub trait Clock: Send + Sync {
    /// Current time in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Accept/flag verdict, used for the overall decision and per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Over threshold
    Flagged,
    /// At or under threshold
    Accepted,
}

impl Verdict {
    /// `Flagged` when `flagged`, else `Accepted`
    pub fn from_flag(flagged: bool) -> Self {
        if flagged {
            Verdict::Flagged
        } else {
            Verdict::Accepted
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Flagged => "FLAGGED",
            Verdict::Accepted => "ACCEPTED",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category entry of the analysis block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDetail {
    /// Derived score
    pub score: f64,
    /// Score against the display threshold
    pub verdict: Verdict,
    /// Always empty; no span-level detection is performed
    pub violations: Vec<String>,
}

/// Category details in derivation order, serialized as a JSON object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryBreakdown(Vec<(&'static str, CategoryDetail)>);

impl CategoryBreakdown {
    /// Detail for a category code
    pub fn get(&self, code: &str) -> Option<&CategoryDetail> {
        self.0.iter().find(|(c, _)| *c == code).map(|(_, d)| d)
    }

    /// Iterate `(code, detail)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CategoryDetail)> + '_ {
        self.0.iter().map(|(c, d)| (*c, d))
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no categories
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CategoryBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (code, detail) in &self.0 {
            map.serialize_entry(code, detail)?;
        }
        map.end()
    }
}

/// Analysis block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Declared language, or `"en"`
    pub language: String,
    /// Highest category score
    pub toxicity: f64,
    /// Per-category detail
    pub categories: CategoryBreakdown,
}

/// Result metadata block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// Same reading as the envelope timestamp
    pub processed_at: String,
    /// Model version string
    pub model_version: String,
}

/// Result block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBody {
    /// Overall decision
    pub decision: Verdict,
    /// Largest raw class probability
    pub confidence: f64,
    /// Category analysis
    pub analysis: Analysis,
    /// Processing metadata
    pub metadata: ResultMetadata,
}

/// Success envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedResponse {
    /// Always `"SUCCESS"`
    pub status: &'static str,
    /// Caller request id, or `"unknown"`
    pub request_id: String,
    /// RFC 3339 timestamp in UTC
    pub timestamp: String,
    /// Wall time spent on the request, in milliseconds
    pub processing_time: u64,
    /// Moderation result
    pub result: ResultBody,
}

/// Failure envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// Always `"ERROR"`
    pub status: &'static str,
    /// Validation reason, or the generic failure message
    pub message: String,
    /// Stable error code (absent for validation failures)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl ErrorResponse {
    /// Validation failure carrying its reason
    pub fn validation(reason: impl Into<String>) -> Self {
        Self {
            status: "ERROR",
            message: reason.into(),
            error: None,
        }
    }

    /// Non-validation failure with a stable code
    pub fn internal(code: &'static str) -> Self {
        Self {
            status: "ERROR",
            message: GENERIC_ERROR_MESSAGE.to_string(),
            error: Some(code),
        }
    }
}

impl From<&ModerationError> for ErrorResponse {
    fn from(err: &ModerationError) -> Self {
        match err {
            ModerationError::Validation(reason) => Self::validation(reason.clone()),
            other => Self::internal(other.code()),
        }
    }
}

/// Builds the success envelope
#[derive(Clone)]
pub struct ResponseFormatter {
    display_threshold: f64,
    model_version: String,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ResponseFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFormatter")
            .field("display_threshold", &self.display_threshold)
            .field("model_version", &self.model_version)
            .finish_non_exhaustive()
    }
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseFormatter {
    /// Formatter with default threshold, model version and the system clock
    pub fn new() -> Self {
        Self {
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the per-category display threshold
    pub fn with_display_threshold(mut self, threshold: f64) -> Self {
        self.display_threshold = threshold;
        self
    }

    /// Set the reported model version
    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = version.into();
        self
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Per-category display threshold
    pub fn display_threshold(&self) -> f64 {
        self.display_threshold
    }

    /// Reported model version
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Assemble the success envelope.
    ///
    /// Reads the clock once; `timestamp` and `metadata.processedAt` always match.
    pub fn format(
        &self,
        result: &ModerationResult,
        request: &ModerationRequest,
        processing_time_ms: u64,
    ) -> FormattedResponse {
        let now = self
            .clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let categories = CategoryBreakdown(
            result
                .categories
                .iter()
                .map(|(code, score)| {
                    let detail = CategoryDetail {
                        score,
                        verdict: Verdict::from_flag(score > self.display_threshold),
                        violations: Vec::new(),
                    };
                    (code, detail)
                })
                .collect(),
        );

        FormattedResponse {
            status: "SUCCESS",
            request_id: request
                .request_id()
                .unwrap_or(UNKNOWN_REQUEST_ID)
                .to_string(),
            timestamp: now.clone(),
            processing_time: processing_time_ms,
            result: ResultBody {
                decision: Verdict::from_flag(result.is_inappropriate),
                confidence: result.confidence,
                analysis: Analysis {
                    language: request.language().unwrap_or(DEFAULT_LANGUAGE).to_string(),
                    toxicity: result.categories.max_score(),
                    categories,
                },
                metadata: ResultMetadata {
                    processed_at: now,
                    model_version: self.model_version.clone(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::moderation::decision::DecisionEngine;
    use crate::taxonomy::{HARASSMENT, HATE_SPEECH, PROFANITY};

    fn fixed_formatter() -> ResponseFormatter {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ResponseFormatter::new().with_clock(Arc::new(FixedClock(instant)))
    }

    #[test]
    fn test_benign_envelope() {
        let result = DecisionEngine::default()
            .decide("You are wonderful", &[0.95, 0.05])
            .unwrap();
        let request = ModerationRequest::from_text("You are wonderful").with_request_id("req-1");

        let response = fixed_formatter().format(&result, &request, 3);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(
            value,
            json!({
                "status": "SUCCESS",
                "requestId": "req-1",
                "timestamp": "2024-01-01T00:00:00.000Z",
                "processingTime": 3,
                "result": {
                    "decision": "ACCEPTED",
                    "confidence": 0.95,
                    "analysis": {
                        "language": "en",
                        "toxicity": 0.05,
                        "categories": {
                            "HATE_SPEECH": {"score": 0.05, "verdict": "ACCEPTED", "violations": []},
                            "PROFANITY": {"score": 0.0, "verdict": "ACCEPTED", "violations": []},
                            "HARASSMENT": {"score": 0.0, "verdict": "ACCEPTED", "violations": []}
                        }
                    },
                    "metadata": {
                        "processedAt": "2024-01-01T00:00:00.000Z",
                        "modelVersion": "v1.0"
                    }
                }
            })
        );
    }

    #[test]
    fn test_flagged_envelope() {
        let result = DecisionEngine::default().decide("I hate you", &[0.1, 0.9]).unwrap();
        let request = ModerationRequest::from_text("I hate you").with_language("fr");

        let response = fixed_formatter().format(&result, &request, 0);

        assert_eq!(response.request_id, "unknown");
        assert_eq!(response.result.decision, Verdict::Flagged);
        assert_eq!(response.result.analysis.language, "fr");
        assert_eq!(response.result.analysis.toxicity, 1.0);
        for code in [HATE_SPEECH, PROFANITY, HARASSMENT] {
            let detail = response.result.analysis.categories.get(code).unwrap();
            assert_eq!(detail.verdict, Verdict::Flagged);
            assert!(detail.violations.is_empty());
        }
    }

    #[test]
    fn test_display_threshold_is_independent() {
        // Engine flags at 0.8, display threshold lowered to 0.5
        let result = DecisionEngine::default().decide("x", &[0.4, 0.6]).unwrap();
        let request = ModerationRequest::from_text("x");

        let response = fixed_formatter()
            .with_display_threshold(0.5)
            .format(&result, &request, 0);
        let hate = response.result.analysis.categories.get(HATE_SPEECH).unwrap();
        assert_eq!(hate.verdict, Verdict::Flagged);

        let response = fixed_formatter().format(&result, &request, 0);
        let hate = response.result.analysis.categories.get(HATE_SPEECH).unwrap();
        assert_eq!(hate.verdict, Verdict::Accepted);
    }

    #[test]
    fn test_fixed_clock_is_deterministic() {
        let result = DecisionEngine::default().decide("x", &[0.7, 0.3]).unwrap();
        let request = ModerationRequest::from_text("x");
        let formatter = fixed_formatter().with_model_version("v2.1");

        let first = formatter.format(&result, &request, 5);
        std::thread::sleep(Duration::from_millis(2));
        let second = formatter.format(&result, &request, 5);

        assert_eq!(first, second);
        assert_eq!(first.timestamp, first.result.metadata.processed_at);
        assert_eq!(first.result.metadata.model_version, "v2.1");
    }

    #[test]
    fn test_error_envelopes() {
        let err = ModerationError::validation("Missing 'content' section");
        let value = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(
            value,
            json!({"status": "ERROR", "message": "Missing 'content' section"})
        );

        let err = ModerationError::Classification("tensor shape [3] != [2]".to_string());
        let value = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "ERROR",
                "message": "An error occurred while processing the request",
                "error": "CLASSIFICATION_FAILED"
            })
        );
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::from_flag(true).to_string(), "FLAGGED");
        assert_eq!(Verdict::from_flag(false).as_str(), "ACCEPTED");
    }
}
