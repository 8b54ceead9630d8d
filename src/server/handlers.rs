//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

use super::state::AppState;
use crate::moderation::ErrorResponse;
use crate::taxonomy::{CategoryTheme, CATEGORY_THEMES, DEFAULT_CATEGORIES};

/// Greeting returned by `GET /`
pub const WELCOME_MESSAGE: &str =
    "Welcome to the content moderation API! Please navigate to api to use the services.";

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body_size = state.config.max_body_size;
    let cors_enabled = state.config.cors_enabled;
    let logging = state.config.logging;

    let mut router = Router::new()
        // Health and discovery
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/v1/categories", get(list_categories))
        // Moderation
        .route("/v1/moderate/text", post(moderate_text))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_size));

    if cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    if logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// Welcome response
#[derive(Serialize)]
pub struct WelcomeResponse {
    /// Greeting text
    pub message: &'static str,
}

async fn welcome() -> impl IntoResponse {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE,
    })
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Loaded classifier backend
    pub classifier: String,
    /// Seconds since startup
    pub uptime_secs: u64,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        classifier: state.classifier_name().to_string(),
        uptime_secs: state.uptime().as_secs(),
    })
}

/// One theme of the taxonomy listing
#[derive(Serialize)]
pub struct ThemeListing {
    /// Theme identifier
    pub theme: CategoryTheme,
    /// Codes in the theme
    pub codes: &'static [&'static str],
}

/// Taxonomy listing response
#[derive(Serialize)]
pub struct CategoriesResponse {
    /// Codes grouped by theme
    pub themes: Vec<ThemeListing>,
    /// Fallback selection
    pub defaults: [&'static str; 3],
}

async fn list_categories() -> impl IntoResponse {
    Json(CategoriesResponse {
        themes: CATEGORY_THEMES
            .iter()
            .map(|(theme, codes)| ThemeListing {
                theme: *theme,
                codes: *codes,
            })
            .collect(),
        defaults: DEFAULT_CATEGORIES,
    })
}

/// Moderate one text
async fn moderate_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            let reason = format!("Invalid JSON body: {}", rejection.body_text());
            warn!(%reason, "Rejected moderation request");
            return (status, Json(ErrorResponse::validation(reason))).into_response();
        },
    };

    match state.moderator.process_async(&body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) if e.is_validation() => {
            warn!(reason = %e, "Invalid moderation request");
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&e))).into_response()
        },
        Err(e) => {
            error!(code = e.code(), error = %e, "Moderation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::from(&e)),
            )
                .into_response()
        },
    }
}
