//! Identity provider boundary.
//!
//! The provider issues sessions and owns the credential, OAuth, password
//! reset and magic-link flows. This crate only talks to it through the
//! [`IdentityProvider`] trait; [`MemoryIdentityProvider`] is an in-process
//! implementation for local development and tests.
//!
//! Session changes the provider initiates on its own (token refresh, sign-out
//! from elsewhere) are pushed over a broadcast channel handed out by
//! [`IdentityProvider::subscribe`].

mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::AuthResult;

pub use memory::{MemoryIdentityProvider, SentEmail, SentEmailKind};

/// A user profile as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
}

/// A token-bearing credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Expiry as a Unix timestamp in seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Result of a session lookup: both halves may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub session: Option<Session>,
    pub user: Option<AuthUser>,
}

impl SessionData {
    pub fn from_session(session: Option<Session>) -> Self {
        let user = session.as_ref().map(|s| s.user.clone());
        Self { session, user }
    }
}

/// Email and password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_redirect_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpCredentials {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub options: SignUpOptions,
}

/// OAuth providers the login screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
    Gitlab,
    Apple,
    Discord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query_params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthCredentials {
    pub provider: OAuthProvider,
    #[serde(default)]
    pub options: OAuthOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordData {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePasswordData {
    pub password: String,
}

/// Fields of the signed-in user to change. Absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_redirect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_create_user: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicLinkData {
    pub email: String,
    #[serde(default)]
    pub options: MagicLinkOptions,
}

/// Kind of session change pushed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// A provider-pushed session change.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// The external authentication backend.
///
/// Every call is an opaque async operation that either yields its data or
/// the provider's [`AuthError`](crate::AuthError).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> AuthResult<Session>;

    /// Starts a redirect-based flow; there is no session until the redirect returns.
    async fn sign_in_with_oauth(&self, credentials: &OAuthCredentials) -> AuthResult<()>;

    /// `None` when the provider requires email confirmation before issuing a session.
    async fn sign_up(&self, credentials: &SignUpCredentials) -> AuthResult<Option<Session>>;

    async fn sign_out(&self) -> AuthResult<()>;

    async fn reset_password_for_email(&self, data: &ResetPasswordData) -> AuthResult<()>;

    async fn update_user(&self, data: &UpdateUserData) -> AuthResult<AuthUser>;

    async fn sign_in_with_otp(&self, data: &MagicLinkData) -> AuthResult<()>;

    async fn get_session(&self) -> AuthResult<SessionData>;

    async fn refresh_session(&self) -> AuthResult<SessionData>;

    /// A fresh receiver for session change events.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}
