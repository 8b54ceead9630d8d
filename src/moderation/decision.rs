//! Score derivation and the accept/flag rule.
//!
//! Three named scores are derived from the violating-class probability `p1`:
//!
//! | Category      | Score                      |
//! |---------------|----------------------------|
//! | `HATE_SPEECH` | `p1`                       |
//! | `PROFANITY`   | `1.0` if `p1 > 0.5`, else 0 |
//! | `HARASSMENT`  | `1.0` if `p1 > 0.7`, else 0 |
//!
//! A result is inappropriate when any derived score exceeds the engine
//! threshold. Confidence is the largest raw class probability, independent of
//! the derived scores.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::classifier::{check_probabilities, VIOLATING};
use crate::config::DEFAULT_THRESHOLD;
use crate::error::Result;
use crate::taxonomy::{HARASSMENT, HATE_SPEECH, PROFANITY};

/// `p1` above which PROFANITY is set
pub const PROFANITY_CUTOFF: f64 = 0.5;

/// `p1` above which HARASSMENT is set
pub const HARASSMENT_CUTOFF: f64 = 0.7;

/// Category scores in derivation order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScores(Vec<(&'static str, f64)>);

impl CategoryScores {
    /// Build from `(code, score)` pairs
    pub fn new(scores: Vec<(&'static str, f64)>) -> Self {
        Self(scores)
    }

    /// Score for a category code
    pub fn get(&self, code: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, score)| *score)
    }

    /// Iterate `(code, score)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().copied()
    }

    /// Highest score (0.0 when empty)
    pub fn max_score(&self) -> f64 {
        self.0.iter().map(|(_, s)| *s).fold(0.0, f64::max)
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

impl Serialize for CategoryScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (code, score) in &self.0 {
            map.serialize_entry(code, score)?;
        }
        map.end()
    }
}

/// Outcome of moderating one text
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ModerationResult {
    /// Original, unnormalized text
    pub text: String,
    /// Whether any derived score exceeded the engine threshold
    pub is_inappropriate: bool,
    /// Largest raw class probability
    pub confidence: f64,
    /// Derived category scores
    pub categories: CategoryScores,
}

/// Applies the derivation and threshold rule
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine {
    threshold: f64,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl DecisionEngine {
    /// Create engine with the given flag threshold
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Flag threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Derive the three category scores from raw class probabilities.
    pub fn derive_scores(probs: &[f64]) -> Result<CategoryScores> {
        check_probabilities(probs)?;
        let violating = probs[VIOLATING];

        Ok(CategoryScores::new(vec![
            (HATE_SPEECH, violating),
            (PROFANITY, binary(violating > PROFANITY_CUTOFF)),
            (HARASSMENT, binary(violating > HARASSMENT_CUTOFF)),
        ]))
    }

    /// Build the moderation result for `text` from its class probabilities.
    pub fn decide(&self, text: &str, probs: &[f64]) -> Result<ModerationResult> {
        let categories = Self::derive_scores(probs)?;
        let is_inappropriate = categories.iter().any(|(_, score)| score > self.threshold);
        let confidence = probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(ModerationResult {
            text: text.to_string(),
            is_inappropriate,
            confidence,
            categories,
        })
    }
}

fn binary(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}
