//! Lexicon classifier: weighted patterns folded into a logistic score.
//!
//! Each pattern that matches adds its weight to a logit that starts at
//! [`DEFAULT_BIAS`]. A pattern counts once no matter how often it occurs.
//! The violating probability is `sigmoid(logit)`.
//!
//! | Pattern        | Weight | Example              |
//! |----------------|--------|----------------------|
//! | `hate_you`     | +5.0   | "i hate you"         |
//! | `death_wish`   | +5.5   | "go die"             |
//! | `threat`       | +5.0   | "i will hurt you"    |
//! | `dehumanizing` | +4.5   | "subhuman"           |
//! | `insult`       | +3.5   | "idiot"              |
//! | `profanity`    | +3.0   | "damn"               |
//! | `dismissive`   | +2.0   | "shut up"            |
//! | `positive`     | -1.0   | "wonderful"          |
//!
//! The output is deterministic and needs no model files, which makes this the
//! default backend.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{TextClassifier, DEFAULT_MAX_INPUT_LEN, NON_VIOLATING, VIOLATING};
use crate::error::Result;

/// Logit before any pattern matches
pub const DEFAULT_BIAS: f64 = -3.0;

/// A weighted lexicon pattern
#[derive(Debug, Clone)]
pub struct LexiconPattern {
    /// Pattern name
    pub name: &'static str,
    /// Regex pattern
    pub pattern: &'static str,
    /// Logit contribution when matched
    pub weight: f64,
    /// Description
    pub description: &'static str,
}

/// Built-in lexicon
pub static LEXICON_PATTERNS: &[LexiconPattern] = &[
    LexiconPattern {
        name: "hate_you",
        pattern: r"(?i)\bhate\s+(you|u|ya|them|him|her)\b",
        weight: 5.0,
        description: "Direct expression of hatred toward a person",
    },
    LexiconPattern {
        name: "death_wish",
        pattern: r"(?i)\b(go\s+die|kill\s+(yourself|urself|you))\b",
        weight: 5.5,
        description: "Wishing death or self-harm on someone",
    },
    LexiconPattern {
        name: "threat",
        pattern: r"(?i)\b(i\s*'?ll|i\s+will|gonna|going\s+to)\s+(hurt|find|beat|get)\s+(you|u)\b",
        weight: 5.0,
        description: "Threat of harm",
    },
    LexiconPattern {
        name: "dehumanizing",
        pattern: r"(?i)\b(subhuman|vermin|parasites?)\b",
        weight: 4.5,
        description: "Dehumanizing language",
    },
    LexiconPattern {
        name: "insult",
        pattern: r"(?i)\b(idiot|moron|stupid|loser|worthless|pathetic|dumb|trash)\b",
        weight: 3.5,
        description: "Personal insult",
    },
    LexiconPattern {
        name: "profanity",
        pattern: r"(?i)\b(damn|crap|wtf|f+u+c+k+\w*|sh[i1]t\w*|bastard)\b",
        weight: 3.0,
        description: "Profane language",
    },
    LexiconPattern {
        name: "dismissive",
        pattern: r"(?i)\bshut\s+up\b",
        weight: 2.0,
        description: "Hostile dismissal",
    },
    LexiconPattern {
        name: "positive",
        pattern: r"(?i)\b(thanks?|thank\s+you|wonderful|great|love|kind|appreciate)\b",
        weight: -1.0,
        description: "Friendly or appreciative language",
    },
];

lazy_static! {
    /// Compiled lexicon patterns
    pub static ref LEXICON_REGEX: Vec<(Regex, &'static LexiconPattern)> = {
        LEXICON_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p.pattern).ok().map(|r| (r, p)))
            .collect()
    };
}

/// Match text against the lexicon
pub fn match_lexicon(text: &str) -> Vec<&'static LexiconPattern> {
    LEXICON_REGEX
        .iter()
        .filter(|(regex, _)| regex.is_match(text))
        .map(|(_, pattern)| *pattern)
        .collect()
}

/// Logistic sigmoid
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Pattern-weighted classifier
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    bias: f64,
    max_input_len: usize,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconClassifier {
    /// Create classifier with the built-in lexicon
    pub fn new() -> Self {
        Self {
            bias: DEFAULT_BIAS,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }

    /// Override the starting logit
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Set the maximum input length (characters)
    pub fn with_max_input_len(mut self, max_input_len: usize) -> Self {
        self.max_input_len = max_input_len.max(1);
        self
    }

    /// Raw logit for text
    pub fn logit(&self, text: &str) -> f64 {
        self.bias + match_lexicon(text).iter().map(|p| p.weight).sum::<f64>()
    }
}

impl TextClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Result<Vec<f64>> {
        let logit = self.logit(text);
        let violating = sigmoid(logit);

        debug!(logit, violating, "Lexicon scored text");

        let mut probs = vec![0.0; 2];
        probs[NON_VIOLATING] = 1.0 - violating;
        probs[VIOLATING] = violating;
        Ok(probs)
    }

    fn name(&self) -> &str {
        "lexicon"
    }

    fn max_input_len(&self) -> usize {
        self.max_input_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(LEXICON_REGEX.len(), LEXICON_PATTERNS.len());
    }

    #[test]
    fn test_friendly_text_scores_low() {
        let classifier = LexiconClassifier::new();
        let probs = classifier.classify("you are wonderful").unwrap();

        assert_eq!(probs.len(), 2);
        assert!(probs[VIOLATING] < 0.1, "got {probs:?}");
        assert!((probs[NON_VIOLATING] + probs[VIOLATING] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hostile_text_scores_high() {
        let classifier = LexiconClassifier::new();
        let probs = classifier.classify("i hate you").unwrap();
        assert!(probs[1] > 0.8, "got {probs:?}");

        let probs = classifier.classify("shut up, you idiot").unwrap();
        assert!(probs[1] > 0.9, "got {probs:?}");
    }

    #[test]
    fn test_pattern_counts_once() {
        let classifier = LexiconClassifier::new();
        let once = classifier.logit("idiot");
        let thrice = classifier.logit("idiot idiot idiot");
        assert!((once - thrice).abs() < 1e-12);
    }

    #[test]
    fn test_match_lexicon_names() {
        let names: Vec<_> = match_lexicon("damn, i hate you")
            .iter()
            .map(|p| p.name)
            .collect();
        assert!(names.contains(&"hate_you"));
        assert!(names.contains(&"profanity"));
        assert!(match_lexicon("what time is it").is_empty());
    }

    #[test]
    fn test_bias_override() {
        let classifier = LexiconClassifier::new().with_bias(0.0);
        let probs = classifier.classify("neutral words").unwrap();
        assert!((probs[1] - 0.5).abs() < 1e-12);
    }
}
