//! Moderation pipeline scenarios through the public API.
//!
//! Covers the documented request scenarios end to end without the HTTP layer,
//! plus configuration-driven construction.

use std::io::Write;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use textmod::classifier::{self, LexiconClassifier, TextClassifier};
use textmod::config::Config;
use textmod::moderation::{
    CategorySelector, FixedClock, ModerationRequest, Moderator, ResponseFormatter, Verdict,
};
use textmod::{DecisionEngine, Result, DEFAULT_CATEGORIES};

/// Replays a fixed probability vector
struct Fixed(Vec<f64>);

impl TextClassifier for Fixed {
    fn classify(&self, _text: &str) -> Result<Vec<f64>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn moderator(probs: &[f64]) -> Moderator {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    Moderator::new(Arc::new(Fixed(probs.to_vec())))
        .with_formatter(ResponseFormatter::new().with_clock(Arc::new(clock)))
}

/// Benign text with low violating probability is accepted
#[test]
fn test_scenario_benign() {
    let response = moderator(&[0.95, 0.05])
        .process(&json!({"content": {"text": "You are wonderful"}}))
        .unwrap();

    let result = &response.result;
    assert_eq!(result.decision, Verdict::Accepted);
    assert_eq!(result.confidence, 0.95);
    let scores: Vec<(&str, f64)> = result
        .analysis
        .categories
        .iter()
        .map(|(code, detail)| (code, detail.score))
        .collect();
    assert_eq!(
        scores,
        vec![("HATE_SPEECH", 0.05), ("PROFANITY", 0.0), ("HARASSMENT", 0.0)]
    );
    assert_eq!(response.timestamp, "2024-06-01T12:00:00.000Z");
}

/// Violating text is flagged, with every category over the display threshold
#[test]
fn test_scenario_violating() {
    let response = moderator(&[0.1, 0.9])
        .process(&json!({"content": {"text": "I hate you"}}))
        .unwrap();

    let result = &response.result;
    assert_eq!(result.decision, Verdict::Flagged);
    assert_eq!(result.confidence, 0.9);
    for (_, detail) in result.analysis.categories.iter() {
        assert_eq!(detail.verdict, Verdict::Flagged);
    }
}

/// Missing text fails validation
#[test]
fn test_scenario_missing_text() {
    let err = moderator(&[0.5, 0.5])
        .process(&json!({"content": {"language": "en"}}))
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Missing 'text' field in content");
}

/// An unknown sensitivity level names the valid set
#[test]
fn test_scenario_bad_sensitivity() {
    let err = moderator(&[0.5, 0.5])
        .process(&json!({
            "content": {"text": "hello"},
            "configuration": {"sensitivityLevel": "EXTREME"}
        }))
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "Invalid sensitivity level. Must be one of LOW, MEDIUM, HIGH"
    );
}

/// Invalid categories fall back to the defaults and leave scores untouched
#[test]
fn test_scenario_invalid_categories() {
    let moderator = moderator(&[0.1, 0.9]);
    let body = json!({
        "content": {"text": "I hate you"},
        "configuration": {"categories": ["FOO", "BAR"], "sensitivityLevel": "LOW"}
    });

    let request = moderator.validate_request(&body).unwrap();
    assert_eq!(moderator.select_categories(&request), DEFAULT_CATEGORIES.to_vec());

    let with_selection = moderator.process(&body).unwrap();
    let without = moderator
        .process(&json!({"content": {"text": "I hate you"}}))
        .unwrap();
    assert_eq!(with_selection.result, without.result);
}

/// Each stage is usable on its own
#[test]
fn test_stages_compose_by_hand() {
    let request = ModerationRequest::from_text("Shut up, you idiot").with_request_id("manual");
    let selected = CategorySelector::new().select(request.requested_categories());
    assert_eq!(selected, DEFAULT_CATEGORIES.to_vec());

    let lexicon = LexiconClassifier::new();
    let normalized = textmod::moderation::normalize(&request.content.text);
    let probs = lexicon.classify(&normalized).unwrap();
    let result = DecisionEngine::default()
        .decide(&request.content.text, &probs)
        .unwrap();
    assert!(result.is_inappropriate);

    let response = ResponseFormatter::new().format(&result, &request, 1);
    assert_eq!(response.request_id, "manual");
    assert_eq!(response.result.decision, Verdict::Flagged);
}

/// A config file drives thresholds and model version
#[test]
fn test_moderator_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[moderation]\nthreshold = 0.95\ndisplay_threshold = 0.5\nmodel_version = \"v2.0\""
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();
    let moderator = Moderator::from_config(&config, Arc::new(Fixed(vec![0.4, 0.6])));

    let response = moderator
        .process(&json!({"content": {"text": "borderline"}}))
        .unwrap();

    // PROFANITY = 1.0 > 0.95, so still flagged
    assert_eq!(response.result.decision, Verdict::Flagged);
    let hate = response.result.analysis.categories.get("HATE_SPEECH").unwrap();
    assert_eq!(hate.verdict, Verdict::Flagged);
    assert_eq!(response.result.metadata.model_version, "v2.0");
}

/// The shared classifier is loaded once and reused
#[test]
fn test_shared_classifier_is_singleton() {
    let config = Config::default();
    let first = classifier::init_shared(&config.classifier).unwrap();
    let second = classifier::init_shared(&config.classifier).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let moderator = Moderator::from_config(&config, first);
    let response = moderator
        .process(&json!({"content": {"text": "You are wonderful"}}))
        .unwrap();
    assert_eq!(response.result.decision, Verdict::Accepted);
}
