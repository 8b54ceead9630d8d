//! Server configuration.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ClassifierBackend, Config};
use crate::error::{ModerationError, Result};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub addr: SocketAddr,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Enable request logging
    pub logging: bool,
    /// CORS enabled
    pub cors_enabled: bool,
    /// Moderation and classifier settings
    pub settings: Config,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let settings = Config::default();
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], settings.server.port)),
            max_body_size: settings.server.max_body_size,
            logging: settings.server.request_logging,
            cors_enabled: settings.server.cors,
            settings,
        }
    }
}

impl ServerConfig {
    /// Build from loaded configuration, resolving the listen address
    pub fn from_config(settings: Config) -> Result<Self> {
        let listen = settings.server.listen_addr();
        let addr = (settings.server.host.as_str(), settings.server.port)
            .to_socket_addrs()
            .map_err(|e| ModerationError::Config(format!("Invalid listen address {listen}: {e}")))?
            .next()
            .ok_or_else(|| ModerationError::Config(format!("No address for {listen}")))?;

        Ok(Self {
            addr,
            max_body_size: settings.server.max_body_size,
            logging: settings.server.request_logging,
            cors_enabled: settings.server.cors,
            settings,
        })
    }

    /// Create with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.addr.set_port(port);
        self.settings.server.port = port;
        self
    }

    /// Bind to all interfaces
    pub fn bind_all(mut self) -> Self {
        self.addr = SocketAddr::from(([0, 0, 0, 0], self.addr.port()));
        self.settings.server.host = "0.0.0.0".to_string();
        self
    }

    /// Use the native classifier with the given model
    pub fn with_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.classifier.backend = ClassifierBackend::Native;
        self.settings.classifier.model_path = Some(path.into());
        self
    }

    /// Set the flag threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.settings.moderation.threshold = threshold;
        self
    }

    /// Set the classification deadline (`None` disables it)
    pub fn with_classify_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.settings.moderation.classify_timeout_ms = timeout.map_or(0, |t| {
            u64::try_from(t.as_millis()).unwrap_or(u64::MAX)
        });
        self
    }

    /// Set max body size
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Disable CORS
    pub fn without_cors(mut self) -> Self {
        self.cors_enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8000");
        assert!(config.cors_enabled);
        assert!(config.logging);
    }

    #[test]
    fn test_builders() {
        let config = ServerConfig::default()
            .with_port(9000)
            .bind_all()
            .with_threshold(0.6)
            .with_model("/models/tox")
            .with_classify_timeout(None)
            .without_cors();

        assert_eq!(config.addr.to_string(), "0.0.0.0:9000");
        assert!((config.settings.moderation.threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.settings.classifier.backend, ClassifierBackend::Native);
        assert_eq!(config.settings.moderation.classify_timeout_ms, 0);
        assert!(!config.cors_enabled);
    }

    #[test]
    fn test_from_config() {
        let mut settings = Config::default();
        settings.server.host = "0.0.0.0".to_string();
        settings.server.port = 8123;
        settings.server.cors = false;

        let config = ServerConfig::from_config(settings).unwrap();
        assert_eq!(config.addr.to_string(), "0.0.0.0:8123");
        assert!(!config.cors_enabled);
    }
}
