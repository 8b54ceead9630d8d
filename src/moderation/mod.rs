//! Moderation core.
//!
//! Turns a JSON request into an accept/flag decision:
//!
//! ```text
//! RequestValidator → CategorySelector → normalize → classifier
//!                  → DecisionEngine → ResponseFormatter
//! ```
//!
//! [`Moderator`] wires these together. Each stage is also usable on its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use textmod::classifier;
//! use textmod::config::Config;
//! use textmod::moderation::Moderator;
//!
//! let config = Config::default();
//! let moderator = Moderator::from_config(&config, classifier::init_shared(&config.classifier)?);
//!
//! let response = moderator.process(&serde_json::json!({
//!     "content": {"text": "You are wonderful"}
//! }))?;
//! assert_eq!(response.result.decision.as_str(), "ACCEPTED");
//! ```

pub mod decision;
pub mod pipeline;
pub mod preprocess;
pub mod request;
pub mod response;
pub mod selector;

pub use decision::{CategoryScores, DecisionEngine, ModerationResult};
pub use pipeline::{Moderator, Stage};
pub use preprocess::normalize;
pub use request::{Configuration, Content, ModerationRequest, RequestMetadata, RequestValidator};
pub use response::{
    Clock, ErrorResponse, FixedClock, FormattedResponse, ResponseFormatter, SystemClock, Verdict,
};
pub use selector::CategorySelector;
