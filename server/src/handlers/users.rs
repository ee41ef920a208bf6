//! User resource rules: validation, normalisation, conflicts, pagination.

use serde::{Deserialize, Serialize};

use crate::db::{Database, User, UserChanges, UserFilter, UserId};
use crate::error::{AppError, Result};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

const USER_NOT_FOUND: &str = "User not found";

/// Query string of `GET /users`. Values arrive as text; unparsable or zero
/// page numbers fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// One page of users.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub data: Vec<User>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub message: String,
}

/// Path ids that do not parse name no user.
pub fn parse_id(raw: &str) -> Result<UserId> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::NotFound(USER_NOT_FOUND.to_string()))
}

fn positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn list_users(db: &Database, query: ListQuery) -> UserPage {
    let page = positive(query.page.as_deref(), DEFAULT_PAGE);
    let limit = positive(query.limit.as_deref(), DEFAULT_LIMIT);
    let filter = UserFilter {
        name: query.name,
        email: query.email,
    };

    let matching = db.users.read().await.filter(&filter);
    let total = matching.len() as u64;
    let start = (page - 1).saturating_mul(limit);
    let data = matching
        .into_iter()
        .skip(usize::try_from(start).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect();

    UserPage {
        data,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
        message: "Users listed successfully".to_string(),
    }
}

pub async fn get_user(db: &Database, id: UserId) -> Result<User> {
    db.users
        .read()
        .await
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
}

pub async fn create_user(db: &Database, body: CreateUserBody) -> Result<User> {
    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    let email = body.email.as_deref().map(normalise_email).unwrap_or_default();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest(
            "Name and email are required".to_string(),
        ));
    }

    let mut users = db.users.write().await;
    if users.email_taken(&email, None) {
        return Err(AppError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let user = users.insert(name, email);
    tracing::info!(id = user.id, "user created");
    Ok(user)
}

pub async fn update_user(db: &Database, id: UserId, body: UpdateUserBody) -> Result<User> {
    let mut users = db.users.write().await;
    if users.get(id).is_none() {
        return Err(AppError::NotFound(USER_NOT_FOUND.to_string()));
    }

    let name = match body.name.as_deref().map(str::trim) {
        Some("") => {
            return Err(AppError::BadRequest(
                "Name must be a non-empty string".to_string(),
            ))
        }
        other => other.map(str::to_string),
    };

    let email = match body.email.as_deref().map(normalise_email) {
        Some(email) if email.is_empty() => {
            return Err(AppError::BadRequest(
                "Email must be a non-empty string".to_string(),
            ))
        }
        Some(email) if users.email_taken(&email, Some(id)) => {
            return Err(AppError::Conflict(
                "Another user already has this email".to_string(),
            ))
        }
        other => other,
    };

    users
        .update(id, UserChanges { name, email })
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
}

pub async fn delete_user(db: &Database, id: UserId) -> Result<User> {
    let removed = db.users.write().await.remove(id);
    match removed {
        Some(user) => {
            tracing::info!(id, "user deleted");
            Ok(user)
        }
        None => Err(AppError::NotFound(USER_NOT_FOUND.to_string())),
    }
}
