//! Text classifier boundary.
//!
//! The moderation core treats the classifier as an opaque scoring capability:
//! normalized text goes in, a probability vector over the binary label space
//! comes out.
//!
//! ```text
//! index 0 → non-violating
//! index 1 → violating
//! ```
//!
//! The only assumption the core makes is that a higher index-1 probability
//! means the text is more likely to violate.
//!
//! # Backends
//!
//! - **Lexicon** (default): weighted regex patterns, no model files needed
//! - **Native**: byte-level safetensors model with pure Rust inference
//!
//! # Process-wide sharing
//!
//! Loading a model is expensive. [`init_shared`] loads the configured backend
//! once per process and hands every caller the same `Arc`:
//!
//! ```rust,ignore
//! use textmod::classifier;
//! use textmod::config::ClassifierConfig;
//!
//! let classifier = classifier::init_shared(&ClassifierConfig::default())?;
//! let probs = classifier.classify("you are wonderful")?;
//! assert_eq!(probs.len(), 2);
//! ```

pub mod lexicon;
pub mod native;

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::{ClassifierBackend, ClassifierConfig};
use crate::error::{ModerationError, Result};

pub use lexicon::LexiconClassifier;
pub use native::{NativeClassifier, ToxicityNet};

/// Default maximum input length, in characters
pub const DEFAULT_MAX_INPUT_LEN: usize = 512;

/// Index of the non-violating class
pub const NON_VIOLATING: usize = 0;

/// Index of the violating class
pub const VIOLATING: usize = 1;

/// A text classifier over the binary {non-violating, violating} label space.
///
/// Implementations are shared read-only across requests, so `classify` takes
/// `&self` and must be callable from any thread. The call may block; async
/// callers should dispatch it to a blocking pool.
pub trait TextClassifier: Send + Sync {
    /// Score normalized text, returning class probabilities that sum to 1.
    fn classify(&self, text: &str) -> Result<Vec<f64>>;

    /// Backend name, for logs and health output.
    fn name(&self) -> &str;

    /// Longest input (in characters) the classifier accepts.
    fn max_input_len(&self) -> usize {
        DEFAULT_MAX_INPUT_LEN
    }
}

/// Shared, read-only classifier handle
pub type SharedClassifier = Arc<dyn TextClassifier>;

static SHARED: Mutex<Option<SharedClassifier>> = Mutex::new(None);

/// Load the configured classifier backend.
///
/// Failure is fatal for the caller: there is no degraded mode.
pub fn load_classifier(config: &ClassifierConfig) -> Result<SharedClassifier> {
    match config.backend {
        ClassifierBackend::Lexicon => {
            Ok(Arc::new(LexiconClassifier::new().with_max_input_len(config.max_input_len)))
        },
        ClassifierBackend::Native => {
            let path = config.model_path.as_ref().ok_or_else(|| {
                ModerationError::ClassifierUnavailable(
                    "native backend selected but no model path configured".to_string(),
                )
            })?;
            let model = NativeClassifier::load(path)?.with_max_input_len(config.max_input_len);
            Ok(Arc::new(model))
        },
    }
}

/// Load the process-wide classifier, or return the one already loaded.
///
/// The first successful call wins; later calls ignore `config` and return the
/// same handle. Concurrent first calls are serialized, so the model is loaded
/// exactly once.
pub fn init_shared(config: &ClassifierConfig) -> Result<SharedClassifier> {
    let mut slot = SHARED
        .lock()
        .map_err(|e| ModerationError::Unexpected(format!("classifier lock poisoned: {e}")))?;

    if let Some(existing) = slot.as_ref() {
        return Ok(Arc::clone(existing));
    }

    let classifier = load_classifier(config)?;
    info!(backend = classifier.name(), "Classifier loaded");
    *slot = Some(Arc::clone(&classifier));
    Ok(classifier)
}

/// The process-wide classifier, if [`init_shared`] has succeeded.
pub fn shared() -> Option<SharedClassifier> {
    SHARED.lock().ok().and_then(|slot| slot.as_ref().map(Arc::clone))
}

/// Cap `text` to at most `max_chars` characters.
///
/// Always cuts on a character boundary, so the result is valid UTF-8 and the
/// same input always yields the same output.
pub fn truncate_input(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Check that a classifier output is usable by the decision rule.
pub fn check_probabilities(probs: &[f64]) -> Result<()> {
    if probs.len() <= VIOLATING {
        return Err(ModerationError::Classification(format!(
            "expected at least 2 class probabilities, got {}",
            probs.len()
        )));
    }
    if probs.iter().any(|p| !p.is_finite()) {
        return Err(ModerationError::Classification(
            "classifier returned a non-finite probability".to_string(),
        ));
    }
    Ok(())
}
