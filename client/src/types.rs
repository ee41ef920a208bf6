//! Domain DTOs and response envelopes for the Vibe API.
//!
//! These mirror the server's schema but are defined independently; the
//! end-to-end tests catch drift between the two crates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the server on create.
pub type UserId = u64;

/// A user as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Payload for `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

impl CreateUserRequest {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Payload for `PUT /users/:id`. Only the fields present are applied;
/// omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: None,
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: Some(email.into()),
        }
    }
}

/// Filters for `GET /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl UserQuery {
    /// Query string without the leading `?`, or `None` when no field is set.
    ///
    /// Fields keep the order name, email, page, limit. Empty strings and
    /// zero numbers count as absent.
    pub fn to_query_string(&self) -> Option<String> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(name) = self.name.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(format!("name={}", urlencoding::encode(name)));
        }
        if let Some(email) = self.email.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(format!("email={}", urlencoding::encode(email)));
        }
        if let Some(page) = self.page.filter(|v| *v > 0) {
            pairs.push(format!("page={page}"));
        }
        if let Some(limit) = self.limit.filter(|v| *v > 0) {
            pairs.push(format!("limit={limit}"));
        }

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("&"))
        }
    }
}

/// The click counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clicks {
    pub clicks: u64,
}

/// Aggregates served by `GET /users/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub email_domains: BTreeMap<String, u64>,
    pub most_common_domain: Option<DomainCount>,
    pub average_name_length: u64,
}

/// An email domain and how many users share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

/// Success envelope: `{ data, message?, total?, page?, limit?, totalPages? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl<T> ApiResponse<T> {
    /// Envelope with only `data` set.
    pub fn new(data: T) -> Self {
        Self {
            data,
            message: None,
            total: None,
            page: None,
            limit: None,
            total_pages: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Error envelope: `{ error: { message, stack? } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

pub type UsersResponse = ApiResponse<Vec<User>>;
pub type UserResponse = ApiResponse<User>;
pub type ClicksResponse = ApiResponse<Clicks>;
pub type UserStatsResponse = ApiResponse<UserStats>;
