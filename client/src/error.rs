//! Error types for the Vibe client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when a transport failure carries no detail of its own.
pub const CONNECTION_ERROR: &str = "connection error with the API";

/// All possible errors from the HTTP wrapper and the resource services.
///
/// The `Display` text of the server-reported variants is the server message
/// verbatim, so stores can hand it straight to the UI.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Server-reported errors
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {status}")]
    Http { status: u16 },

    // Transport errors
    #[error("{0}")]
    Transport(String),

    #[error("connection error with the API")]
    Connection,

    // Payload errors
    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("failed to serialize request: {0}")]
    Serialize(String),
}

impl Error {
    /// Build the typed error for a non-success status and its server message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => Error::Validation(message),
            404 => Error::NotFound(message),
            409 => Error::Conflict(message),
            _ => Error::Api { status, message },
        }
    }

    /// HTTP status the server answered with, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Validation(_) => Some(400),
            Error::NotFound(_) => Some(404),
            Error::Conflict(_) => Some(409),
            Error::Api { status, .. } | Error::Http { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Error::Decode(err.to_string());
        }
        let message = err.to_string();
        if message.is_empty() {
            Error::Connection
        } else {
            Error::Transport(message)
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by the identity provider.
///
/// Store actions hand these back untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct AuthError {
    /// Machine-readable code, e.g. `invalid_credentials`
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// HTTP-like status when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Result type for identity provider calls.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("API prefix must start with '/': {0}")]
    InvalidPrefix(String),
}

/// Turn any displayable failure into the string a store keeps in `error`.
///
/// Falls back to `fallback` when the failure renders as an empty message.
pub fn display_message(err: &impl std::fmt::Display, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_server_message() {
        let err = Error::Conflict("A user with this email already exists".into());
        assert_eq!(err.to_string(), "A user with this email already exists");

        let err = Error::Http { status: 502 };
        assert_eq!(err.to_string(), "HTTP error: 502");

        assert_eq!(Error::Connection.to_string(), CONNECTION_ERROR);
    }

    #[test]
    fn from_status_maps_taxonomy() {
        assert!(matches!(
            Error::from_status(400, "bad".into()),
            Error::Validation(_)
        ));
        assert!(matches!(
            Error::from_status(404, "gone".into()),
            Error::NotFound(_)
        ));
        assert!(matches!(
            Error::from_status(409, "dup".into()),
            Error::Conflict(_)
        ));
        assert_eq!(
            Error::from_status(500, "boom".into()),
            Error::Api {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[test]
    fn status_of_transport_errors_is_none() {
        assert_eq!(Error::Transport("refused".into()).status(), None);
        assert_eq!(Error::NotFound("x".into()).status(), Some(404));
    }

    #[test]
    fn display_message_falls_back_on_empty() {
        let err = Error::Validation(String::new());
        assert_eq!(display_message(&err, "Failed to load users"), "Failed to load users");

        let err = Error::Validation("Name is required".into());
        assert_eq!(display_message(&err, "Failed to load users"), "Name is required");
    }

    #[test]
    fn auth_error_serializes_camel_case() {
        let err = AuthError::new("invalid_credentials", "Invalid login credentials").with_status(400);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "invalid_credentials");
        assert_eq!(json["status"], 400);
        assert_eq!(err.to_string(), "Invalid login credentials");
    }
}
