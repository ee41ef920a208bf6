//! Unified error handling for the server.
//!
//! Every failure leaves as `{ "error": { "message": ..., "stack"?: ... } }`.
//! The stack is only filled in by [`attach_stack`] when the server runs in
//! development.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                stack: None,
            },
        }
    }
}

/// Message and debug representation of the error behind a response.
#[derive(Debug, Clone)]
struct ErrorReport {
    message: String,
    stack: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(msg) = &self {
            tracing::error!("Internal error: {}", msg);
        }

        let report = ErrorReport {
            message: self.to_string(),
            stack: format!("{self:?}"),
        };
        let mut response = (status, Json(ErrorBody::new(report.message.clone()))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Response mapper adding the stack to error bodies in development.
pub async fn attach_stack(State(state): State<AppState>, response: Response) -> Response {
    if !state.config.is_development() {
        return response;
    }
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let body = ErrorBody {
        error: ErrorDetail {
            message: report.message,
            stack: Some(report.stack),
        },
    };
    (response.status(), Json(body)).into_response()
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_omits_missing_stack() {
        let json = serde_json::to_value(ErrorBody::new("User not found")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": { "message": "User not found" } }));
    }

    #[test]
    fn test_response_carries_message_and_status() {
        let response = AppError::Conflict("taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "taken");
        assert!(report.stack.contains("Conflict"));
    }
}
