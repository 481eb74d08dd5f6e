//! Route configuration and setup.

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sealdrop_core::Config;

use crate::handlers::{create_upload, download, file_info};
use crate::state::AppState;

/// Assemble the application router.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/create-upload", post(create_upload::create_upload))
        .route("/api/download", post(download::download))
        .route("/api/file-info", get(file_info::file_info))
        .layer(setup_cors(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn setup_cors(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
