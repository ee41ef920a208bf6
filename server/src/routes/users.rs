//! User resource routes.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::db::{User, UserStats};
use crate::error::Result;
use crate::handlers::{self, CreateUserBody, ListQuery, UpdateUserBody, UserPage};
use crate::AppState;

/// `{ data, message }` success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    pub message: String,
}

impl<T> Envelope<T> {
    pub(crate) fn new(data: T, message: &str) -> Json<Self> {
        Json(Self {
            data,
            message: message.to_string(),
        })
    }
}

/// Create user routes. `/users/stats` is matched before `/users/{id}`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/stats", get(user_stats))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// GET /users
async fn list_users(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<UserPage>> {
    let Query(query) = query?;
    Ok(Json(handlers::list_users(&state.db, query).await))
}

/// GET /users/stats
async fn user_stats(State(state): State<AppState>) -> Json<Envelope<UserStats>> {
    let stats = state.db.users.read().await.stats();
    Envelope::new(stats, "Statistics retrieved successfully")
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<User>>> {
    let id = handlers::parse_id(&id)?;
    let user = handlers::get_user(&state.db, id).await?;
    Ok(Envelope::new(user, "User found successfully"))
}

/// POST /users
async fn create_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<User>>)> {
    let Json(body) = payload?;
    let user = handlers::create_user(&state.db, body).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::new(user, "User created successfully"),
    ))
}

/// PUT /users/{id}
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateUserBody>, JsonRejection>,
) -> Result<Json<Envelope<User>>> {
    let id = handlers::parse_id(&id)?;
    let Json(body) = payload?;
    let user = handlers::update_user(&state.db, id, body).await?;
    Ok(Envelope::new(user, "User updated successfully"))
}

/// DELETE /users/{id}
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<User>>> {
    let id = handlers::parse_id(&id)?;
    let user = handlers::delete_user(&state.db, id).await?;
    Ok(Envelope::new(user, "User deleted successfully"))
}
