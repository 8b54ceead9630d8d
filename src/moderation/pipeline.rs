//! Request lifecycle orchestration.
//!
//! ```text
//! RECEIVED → VALIDATED → CLASSIFIED → FORMATTED → RESPONDED
//!     └──────────┴────────────┴─────────────┴──────→ ERROR
//! ```
//!
//! A validation failure stops the request before the classifier is touched.
//! There are no retries.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use super::decision::{DecisionEngine, ModerationResult};
use super::preprocess::normalize;
use super::request::{ModerationRequest, RequestValidator};
use super::response::{FormattedResponse, ResponseFormatter};
use super::selector::CategorySelector;
use crate::classifier::{truncate_input, SharedClassifier, VIOLATING};
use crate::config::Config;
use crate::error::{ModerationError, Result};

/// Lifecycle stage of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Body accepted for processing
    Received,
    /// Validation passed
    Validated,
    /// Classifier scores available
    Classified,
    /// Envelope built
    Formatted,
    /// Envelope handed back to the caller
    Responded,
    /// Processing stopped with an error
    Error,
}

impl Stage {
    /// Upper-case stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "RECEIVED",
            Stage::Validated => "VALIDATED",
            Stage::Classified => "CLASSIFIED",
            Stage::Formatted => "FORMATTED",
            Stage::Responded => "RESPONDED",
            Stage::Error => "ERROR",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs requests through validation, classification, decision and formatting.
///
/// Holds the shared classifier handle; cloning a `Moderator` never reloads
/// the model.
#[derive(Clone)]
pub struct Moderator {
    classifier: SharedClassifier,
    validator: RequestValidator,
    selector: CategorySelector,
    engine: DecisionEngine,
    formatter: ResponseFormatter,
    classify_timeout: Option<Duration>,
}

impl fmt::Debug for Moderator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Moderator")
            .field("classifier", &self.classifier.name())
            .field("engine", &self.engine)
            .field("formatter", &self.formatter)
            .field("classify_timeout", &self.classify_timeout)
            .finish()
    }
}

impl Moderator {
    /// Moderator with default threshold, formatter and no deadline
    pub fn new(classifier: SharedClassifier) -> Self {
        Self {
            classifier,
            validator: RequestValidator::new(),
            selector: CategorySelector::new(),
            engine: DecisionEngine::default(),
            formatter: ResponseFormatter::new(),
            classify_timeout: None,
        }
    }

    /// Moderator configured from the `moderation` section
    pub fn from_config(config: &Config, classifier: SharedClassifier) -> Self {
        let moderation = &config.moderation;
        Self::new(classifier)
            .with_engine(DecisionEngine::new(moderation.threshold))
            .with_formatter(
                ResponseFormatter::new()
                    .with_display_threshold(moderation.display_threshold)
                    .with_model_version(moderation.model_version.clone()),
            )
            .with_classify_timeout(moderation.classify_timeout())
    }

    /// Replace the decision engine
    pub fn with_engine(mut self, engine: DecisionEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Replace the response formatter
    pub fn with_formatter(mut self, formatter: ResponseFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Set the classification deadline used by [`Moderator::process_async`]
    pub fn with_classify_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.classify_timeout = timeout;
        self
    }

    /// Shared classifier handle
    pub fn classifier(&self) -> &SharedClassifier {
        &self.classifier
    }

    /// Decision engine
    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Validate a raw request body
    pub fn validate_request(&self, body: &Value) -> Result<ModerationRequest> {
        self.validator.validate(body)
    }

    /// Categories selected for a request.
    ///
    /// The selection is reported and logged but does not feed the decision rule.
    pub fn select_categories(&self, request: &ModerationRequest) -> Vec<&'static str> {
        self.selector.select(request.requested_categories())
    }

    /// Normalize, truncate, classify and decide, synchronously.
    pub fn moderate_text(&self, text: &str) -> Result<ModerationResult> {
        let input = self.prepare_input(text);
        let probs = self.classifier.classify(&input)?;
        self.decide(text, &probs)
    }

    /// Build the success envelope for a result
    pub fn format_response(
        &self,
        result: &ModerationResult,
        request: &ModerationRequest,
        processing_time_ms: u64,
    ) -> FormattedResponse {
        self.formatter.format(result, request, processing_time_ms)
    }

    /// Run the full pipeline on the calling thread.
    ///
    /// The classification deadline is not applied here; use
    /// [`Moderator::process_async`] when a deadline is needed.
    pub fn process(&self, body: &Value) -> Result<FormattedResponse> {
        let started = Instant::now();
        debug!(stage = %Stage::Received, "Moderation request");

        let outcome = self
            .accept(body)
            .and_then(|request| {
                let result = self.moderate_text(&request.content.text)?;
                Ok((request, result))
            })
            .map(|(request, result)| self.finish(&result, &request, started));

        log_outcome(outcome)
    }

    /// Run the full pipeline, classifying on tokio's blocking pool.
    ///
    /// The classifier call is bounded by the configured deadline; expiry yields
    /// [`ModerationError::ClassifierTimeout`]. The blocking task itself is not
    /// interrupted and finishes in the background.
    pub async fn process_async(&self, body: &Value) -> Result<FormattedResponse> {
        let started = Instant::now();
        debug!(stage = %Stage::Received, "Moderation request");

        let outcome = match self.accept(body) {
            Ok(request) => match self.classify_async(&request.content.text).await {
                Ok(result) => Ok(self.finish(&result, &request, started)),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        log_outcome(outcome)
    }

    async fn classify_async(&self, text: &str) -> Result<ModerationResult> {
        let input = self.prepare_input(text);
        let classifier = Arc::clone(&self.classifier);
        let task = tokio::task::spawn_blocking(move || classifier.classify(&input));

        let joined = match self.classify_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| ModerationError::ClassifierTimeout(limit))?,
            None => task.await,
        };
        let probs = joined??;

        self.decide(text, &probs)
    }

    fn accept(&self, body: &Value) -> Result<ModerationRequest> {
        let request = self.validate_request(body)?;
        let categories = self.select_categories(&request);
        debug!(
            stage = %Stage::Validated,
            categories = ?categories,
            sensitivity = ?request.sensitivity_level(),
            request_id = request.request_id().unwrap_or("-"),
            "Request validated"
        );
        Ok(request)
    }

    fn prepare_input(&self, text: &str) -> String {
        let normalized = normalize(text);
        truncate_input(&normalized, self.classifier.max_input_len()).to_string()
    }

    fn decide(&self, text: &str, probs: &[f64]) -> Result<ModerationResult> {
        let result = self.engine.decide(text, probs)?;
        debug!(
            stage = %Stage::Classified,
            violating = probs[VIOLATING],
            flagged = result.is_inappropriate,
            "Classifier scores"
        );
        Ok(result)
    }

    fn finish(
        &self,
        result: &ModerationResult,
        request: &ModerationRequest,
        started: Instant,
    ) -> FormattedResponse {
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let response = self.format_response(result, request, elapsed_ms);
        debug!(stage = %Stage::Formatted, elapsed_ms, "Response formatted");
        response
    }
}

fn log_outcome(outcome: Result<FormattedResponse>) -> Result<FormattedResponse> {
    match &outcome {
        Ok(response) => debug!(
            stage = %Stage::Responded,
            request_id = %response.request_id,
            decision = %response.result.decision,
            "Moderation complete"
        ),
        Err(e) => debug!(stage = %Stage::Error, code = e.code(), "Moderation failed"),
    }
    outcome
}
