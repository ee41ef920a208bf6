//! Click counter routes.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::users::Envelope;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ClickCount {
    pub clicks: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/clicks", get(get_clicks).put(increment_clicks))
}

/// GET /clicks
async fn get_clicks(State(state): State<AppState>) -> Json<Envelope<ClickCount>> {
    let clicks = state.db.clicks();
    Envelope::new(ClickCount { clicks }, "Clicks retrieved successfully")
}

/// PUT /clicks - increment and answer with the new count.
async fn increment_clicks(State(state): State<AppState>) -> Json<Envelope<ClickCount>> {
    let clicks = state.db.increment_clicks();
    tracing::debug!(clicks, "click recorded");
    Envelope::new(ClickCount { clicks }, "Clicks updated successfully")
}
