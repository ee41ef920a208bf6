//! HTTP route definitions.

mod clicks;
mod health;
mod users;

use axum::{extract::OriginalUri, http::Method, Router};

use crate::error::AppError;
use crate::AppState;

/// Create all application routes. Resource routes are nested under
/// `api_prefix`; health and info stay at the root.
pub fn create_routes(api_prefix: &str) -> Router<AppState> {
    let api = Router::new().merge(users::routes()).merge(clicks::routes());

    Router::new()
        .merge(health::routes())
        .nest(api_prefix, api)
        .fallback(not_found)
}

async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("Route {} {} not found", method, uri.path()))
}
