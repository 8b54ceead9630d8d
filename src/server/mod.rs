//! Moderation HTTP server.
//!
//! Routes:
//! - `GET /` - welcome message
//! - `GET /health` - liveness and loaded classifier
//! - `GET /v1/categories` - taxonomy listing
//! - `POST /v1/moderate/text` - moderate one text
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use textmod::server::{create_router, AppState, ServerConfig};
//!
//! let config = ServerConfig::default().with_port(8080);
//! let state = Arc::new(AppState::try_new(config.clone())?);
//! let listener = tokio::net::TcpListener::bind(config.addr).await?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

mod config;
mod handlers;
mod state;

pub use config::ServerConfig;
pub use handlers::{create_router, health_check, WELCOME_MESSAGE};
pub use state::AppState;
