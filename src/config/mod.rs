//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`TEXTMOD_*`)
//! - CLI arguments (for `textmod serve`)
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [moderation]
//! threshold = 0.8
//! display_threshold = 0.8
//! classify_timeout_ms = 5000
//!
//! [classifier]
//! backend = "native"
//! model_path = "/var/lib/textmod/model.safetensors"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::DEFAULT_MAX_INPUT_LEN;
use crate::error::{ModerationError, Result};

/// Default engine threshold
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Default per-category display threshold
pub const DEFAULT_DISPLAY_THRESHOLD: f64 = 0.8;

/// Default model version reported in responses
pub const DEFAULT_MODEL_VERSION: &str = "v1.0";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ListenConfig,

    /// Decision and formatting configuration
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// Classifier backend configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ModerationError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Load file (explicit, or the default location if it exists), then apply env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(path)?,
                _ => Self::default(),
            },
        };

        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TEXTMOD_*` environment variables on top of this config
    pub fn with_env_overrides(mut self) -> Result<Self> {
        // Server settings
        if let Ok(host) = std::env::var("TEXTMOD_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("TEXTMOD_PORT") {
            self.server.port = parse_env("TEXTMOD_PORT", &port)?;
        }

        // Moderation settings
        if let Ok(val) = std::env::var("TEXTMOD_THRESHOLD") {
            self.moderation.threshold = parse_env("TEXTMOD_THRESHOLD", &val)?;
        }
        if let Ok(val) = std::env::var("TEXTMOD_DISPLAY_THRESHOLD") {
            self.moderation.display_threshold = parse_env("TEXTMOD_DISPLAY_THRESHOLD", &val)?;
        }
        if let Ok(val) = std::env::var("TEXTMOD_TIMEOUT_MS") {
            self.moderation.classify_timeout_ms = parse_env("TEXTMOD_TIMEOUT_MS", &val)?;
        }

        // Classifier settings
        if let Ok(val) = std::env::var("TEXTMOD_CLASSIFIER") {
            self.classifier.backend = val.parse()?;
        }
        if let Ok(path) = std::env::var("TEXTMOD_MODEL_PATH") {
            self.classifier.model_path = Some(PathBuf::from(path));
        }

        Ok(self)
    }

    /// Check value ranges and backend requirements
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("moderation.threshold", self.moderation.threshold)?;
        check_unit_interval(
            "moderation.display_threshold",
            self.moderation.display_threshold,
        )?;

        if self.server.port == 0 {
            return Err(ModerationError::Config(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.classifier.max_input_len == 0 {
            return Err(ModerationError::Config(
                "classifier.max_input_len must be positive".to_string(),
            ));
        }
        if self.classifier.backend == ClassifierBackend::Native
            && self.classifier.model_path.is_none()
        {
            return Err(ModerationError::Config(
                "classifier.model_path is required for the native backend".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default config file location (`<config dir>/textmod/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("textmod").join("config.toml"))
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ModerationError::Config(format!("{name} has an invalid value: {value:?}")))
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ModerationError::Config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub cors: bool,

    /// Enable per-request trace logging
    pub request_logging: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_body_size: 1024 * 1024, // 1 MB
            cors: true,
            request_logging: true,
        }
    }
}

impl ListenConfig {
    /// Get the full listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Decision and formatting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Engine threshold: a request is flagged when any derived score exceeds it
    pub threshold: f64,

    /// Per-category display threshold for `FLAGGED`/`ACCEPTED` verdicts
    pub display_threshold: f64,

    /// Model version echoed in response metadata
    pub model_version: String,

    /// Deadline for one classifier call in milliseconds (0 disables)
    pub classify_timeout_ms: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            classify_timeout_ms: 5000,
        }
    }
}

impl ModerationConfig {
    /// Classifier deadline, if enabled
    pub fn classify_timeout(&self) -> Option<std::time::Duration> {
        (self.classify_timeout_ms > 0)
            .then(|| std::time::Duration::from_millis(self.classify_timeout_ms))
    }
}

/// Which classifier backend to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// Weighted lexicon patterns (no model files needed)
    #[default]
    Lexicon,
    /// Native safetensors model
    Native,
}

impl std::str::FromStr for ClassifierBackend {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexicon" => Ok(ClassifierBackend::Lexicon),
            "native" => Ok(ClassifierBackend::Native),
            other => Err(ModerationError::Config(format!(
                "Unknown classifier backend: {other}. Use: lexicon, native"
            ))),
        }
    }
}

/// Classifier backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Backend to load
    pub backend: ClassifierBackend,

    /// Model file or directory (native backend)
    pub model_path: Option<PathBuf>,

    /// Maximum classifier input, in characters; longer input is truncated
    pub max_input_len: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Lexicon,
            model_path: None,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert!((config.moderation.threshold - 0.8).abs() < f64::EPSILON);
        assert!((config.moderation.display_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.moderation.model_version, "v1.0");
        assert_eq!(config.classifier.backend, ClassifierBackend::Lexicon);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listen_addr() {
        let config = ListenConfig::default();
        assert_eq!(config.listen_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 9090

            [moderation]
            threshold = 0.6
            classify_timeout_ms = 0

            [classifier]
            backend = "native"
            model_path = "/models/tox"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert!(config.server.cors);
        assert!((config.moderation.threshold - 0.6).abs() < f64::EPSILON);
        assert!((config.moderation.display_threshold - 0.8).abs() < f64::EPSILON);
        assert!(config.moderation.classify_timeout().is_none());
        assert_eq!(config.classifier.backend, ClassifierBackend::Native);
        assert_eq!(
            config.classifier.model_path.as_deref(),
            Some(Path::new("/models/tox"))
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[moderation]\nthreshold = 0.5").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!((config.moderation.threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_file_with_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[moderation]\nthreshold = \"high\"").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/textmod.toml").unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_validate_threshold_range() {
        let mut config = Config::default();
        config.moderation.threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.moderation.display_threshold = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_native_needs_path() {
        let mut config = Config::default();
        config.classifier.backend = ClassifierBackend::Native;
        assert!(config.validate().is_err());

        config.classifier.model_path = Some(PathBuf::from("model.safetensors"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("Native".parse::<ClassifierBackend>().unwrap(), ClassifierBackend::Native);
        assert_eq!(" lexicon ".parse::<ClassifierBackend>().unwrap(), ClassifierBackend::Lexicon);
        assert!("onnx".parse::<ClassifierBackend>().is_err());
    }

    #[test]
    fn test_parse_env_value() {
        let port: u16 = parse_env("TEXTMOD_PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);
        assert!(parse_env::<u16>("TEXTMOD_PORT", "eighty").is_err());
    }
}
