//! Health and info endpoints.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime: f64,
    pub environment: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rust_version: Option<String>,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(info))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.config.environment.clone(),
    })
}

async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Vibe Template BFF".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Backend-for-frontend for the Vibe template".to_string(),
        rust_version: option_env!("CARGO_PKG_RUST_VERSION")
            .filter(|v| !v.is_empty())
            .map(String::from),
    })
}
