//! Server state.

use std::time::{Duration, Instant};

use super::config::ServerConfig;
use crate::classifier;
use crate::error::Result;
use crate::moderation::Moderator;

/// Application state shared across handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Moderation pipeline over the process-wide classifier
    pub moderator: Moderator,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Load the shared classifier and build the pipeline.
    ///
    /// Fails when the classifier cannot be loaded; the server must not start
    /// without one.
    pub fn try_new(config: ServerConfig) -> Result<Self> {
        let classifier = classifier::init_shared(&config.settings.classifier)?;
        let moderator = Moderator::from_config(&config.settings, classifier);
        Ok(Self::with_moderator(config, moderator))
    }

    /// Build state around an existing pipeline
    pub fn with_moderator(config: ServerConfig, moderator: Moderator) -> Self {
        Self {
            config,
            moderator,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Name of the loaded classifier backend
    pub fn classifier_name(&self) -> &str {
        self.moderator.classifier().name()
    }
}
