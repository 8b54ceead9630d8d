//! # textmod - Text Moderation Service
//!
//! Taxonomy-driven accept/flag decisions for user-generated text, built
//! around a single shared classifier.
//!
//! ## Features
//!
//! - **Request validation**: structural and semantic checks with precise reasons
//! - **Category taxonomy**: closed set of 34 codes with a three-code fallback
//! - **Pluggable classifiers**: lexicon patterns or a native safetensors model
//! - **Deterministic decisions**: fixed score derivation and threshold rule
//! - **HTTP API**: Axum server with sanitized error envelopes
//!
//! ## Pipeline
//!
//! ```text
//! request JSON
//!     │
//!     v
//! [RequestValidator] ──(invalid)──> 400 {"status":"ERROR","message":...}
//!     │
//!     v
//! [CategorySelector]   selected categories (logged, not scored)
//!     │
//!     v
//! [normalize] → [truncate] → [TextClassifier]   [p0, p1]
//!     │
//!     v
//! [DecisionEngine]     HATE_SPEECH = p1
//!     │                PROFANITY   = p1 > 0.5
//!     │                HARASSMENT  = p1 > 0.7
//!     v
//! [ResponseFormatter] ──> 200 {"status":"SUCCESS", ...}
//! ```
//!
//! ## Decision Rule
//!
//! | Output          | Value                                          |
//! |-----------------|------------------------------------------------|
//! | `decision`      | `FLAGGED` iff any category score > threshold   |
//! | `confidence`    | `max(p0, p1)`                                  |
//! | `toxicity`      | highest category score                         |
//! | category verdict| `FLAGGED` iff score > display threshold        |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use textmod::{classifier, Config, Moderator};
//!
//! let config = Config::load(None)?;
//! let shared = classifier::init_shared(&config.classifier)?;
//! let moderator = Moderator::from_config(&config, shared);
//!
//! let response = moderator.process(&serde_json::json!({
//!     "content": {"text": "I hate you"},
//!     "metadata": {"requestId": "req-1"}
//! }))?;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```
//!
//! ## Modules
//!
//! - [`taxonomy`]: Category codes and sensitivity levels
//! - [`classifier`]: Classifier trait, backends and process-wide sharing
//! - [`moderation`]: Validation, selection, decision and formatting
//! - [`server`]: HTTP API server (Axum-based)
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod classifier;
pub mod config;
pub mod error;
pub mod moderation;
pub mod server;
pub mod taxonomy;

// Re-exports for convenience
pub use classifier::{SharedClassifier, TextClassifier};
pub use config::Config;
pub use error::{ModerationError, Result};
pub use moderation::{
    DecisionEngine, ErrorResponse, FormattedResponse, ModerationRequest, ModerationResult,
    Moderator, ResponseFormatter, Verdict,
};
pub use server::{AppState, ServerConfig};
pub use taxonomy::{SensitivityLevel, DEFAULT_CATEGORIES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
