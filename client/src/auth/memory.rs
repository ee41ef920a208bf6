//! In-memory identity provider.
//!
//! Keeps accounts and the current session in process memory and records the
//! emails it would have sent. State is lost when the provider is dropped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{
    AuthChange, AuthEvent, AuthUser, Credentials, IdentityProvider, MagicLinkData,
    OAuthCredentials, OAuthProvider, ResetPasswordData, Session, SessionData, SignUpCredentials,
    UpdateUserData,
};
use crate::error::{AuthError, AuthResult};

/// Minimum password length accepted on sign-up and password change.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Session lifetime in seconds.
const SESSION_TTL_SECS: i64 = 3600;

/// Capacity of the change broadcast channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Why an email was "sent".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentEmailKind {
    PasswordReset,
    MagicLink,
}

/// An email the provider would have delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub kind: SentEmailKind,
    pub to: String,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone)]
struct Account {
    user: AuthUser,
    password: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Accounts keyed by lower-cased email
    accounts: HashMap<String, Account>,
    current: Option<Session>,
    outbox: Vec<SentEmail>,
    oauth_requests: Vec<OAuthProvider>,
    fail_next: Option<AuthError>,
}

/// [`IdentityProvider`] backed by process memory.
#[derive(Debug)]
pub struct MemoryIdentityProvider {
    inner: Mutex<Inner>,
    changes: broadcast::Sender<AuthChange>,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner::default()),
            changes,
        }
    }

    /// Register an account without signing in.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        {
            let mut inner = self.lock();
            let user = new_user(email, serde_json::Map::new());
            inner.accounts.insert(
                email.to_lowercase(),
                Account {
                    user,
                    password: Some(password.to_string()),
                },
            );
        }
        self
    }

    /// Make the next provider call fail with `err`.
    pub fn fail_next(&self, err: AuthError) {
        self.lock().fail_next = Some(err);
    }

    /// Emails recorded so far.
    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.lock().outbox.clone()
    }

    /// OAuth flows started so far.
    pub fn oauth_requests(&self) -> Vec<OAuthProvider> {
        self.lock().oauth_requests.clone()
    }

    /// The session the provider currently considers active.
    pub fn current_session(&self) -> Option<Session> {
        self.lock().current.clone()
    }

    /// Push a change as if it originated outside this process, replacing the
    /// active session.
    pub fn push_change(&self, event: AuthEvent, session: Option<Session>) {
        self.lock().current = session.clone();
        self.emit(event, session);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> AuthResult<()> {
        match self.lock().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn emit(&self, event: AuthEvent, session: Option<Session>) {
        // No subscribers is fine.
        let _ = self.changes.send(AuthChange { event, session });
    }
}

fn new_user(email: &str, metadata: serde_json::Map<String, serde_json::Value>) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4().to_string(),
        email: Some(email.trim().to_lowercase()),
        user_metadata: metadata,
    }
}

fn issue_session(user: AuthUser) -> Session {
    Session {
        access_token: Uuid::new_v4().simple().to_string(),
        refresh_token: Uuid::new_v4().simple().to_string(),
        token_type: "bearer".to_string(),
        expires_at: Some(Utc::now().timestamp() + SESSION_TTL_SECS),
        user,
    }
}

fn validate_email(email: &str) -> AuthResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AuthError::new(
            "validation_failed",
            "Unable to validate email address: invalid format",
        )
        .with_status(400)),
    }
}

fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::new(
            "weak_password",
            format!("Password should be at least {MIN_PASSWORD_LEN} characters."),
        )
        .with_status(422));
    }
    Ok(())
}

fn no_session() -> AuthError {
    AuthError::new("session_not_found", "Auth session missing!").with_status(401)
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> AuthResult<Session> {
        self.take_failure()?;
        let session = {
            let mut inner = self.lock();
            let account = inner
                .accounts
                .get(&credentials.email.trim().to_lowercase())
                .filter(|a| a.password.as_deref() == Some(credentials.password.as_str()))
                .ok_or_else(|| {
                    AuthError::new("invalid_credentials", "Invalid login credentials")
                        .with_status(400)
                })?;
            let session = issue_session(account.user.clone());
            inner.current = Some(session.clone());
            session
        };
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_in_with_oauth(&self, credentials: &OAuthCredentials) -> AuthResult<()> {
        self.take_failure()?;
        self.lock().oauth_requests.push(credentials.provider);
        Ok(())
    }

    async fn sign_up(&self, credentials: &SignUpCredentials) -> AuthResult<Option<Session>> {
        self.take_failure()?;
        validate_email(&credentials.email)?;
        validate_password(&credentials.password)?;

        let session = {
            let mut inner = self.lock();
            let key = credentials.email.trim().to_lowercase();
            if inner.accounts.contains_key(&key) {
                return Err(
                    AuthError::new("user_already_exists", "User already registered")
                        .with_status(422),
                );
            }
            let user = new_user(
                &credentials.email,
                credentials.options.data.clone().unwrap_or_default(),
            );
            inner.accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password: Some(credentials.password.clone()),
                },
            );
            let session = issue_session(user);
            inner.current = Some(session.clone());
            session
        };
        self.emit(AuthEvent::SignedIn, Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.take_failure()?;
        self.lock().current = None;
        self.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    async fn reset_password_for_email(&self, data: &ResetPasswordData) -> AuthResult<()> {
        self.take_failure()?;
        validate_email(&data.email)?;
        // Unknown addresses succeed too, so callers cannot probe for accounts.
        let mut inner = self.lock();
        if inner.accounts.contains_key(&data.email.trim().to_lowercase()) {
            inner.outbox.push(SentEmail {
                kind: SentEmailKind::PasswordReset,
                to: data.email.trim().to_lowercase(),
                redirect_to: data.redirect_to.clone(),
            });
        }
        Ok(())
    }

    async fn update_user(&self, data: &UpdateUserData) -> AuthResult<AuthUser> {
        self.take_failure()?;
        if let Some(email) = &data.email {
            validate_email(email)?;
        }
        if let Some(password) = &data.password {
            validate_password(password)?;
        }

        let session = {
            let mut inner = self.lock();
            let current = inner.current.clone().ok_or_else(no_session)?;
            let old_key = current
                .user
                .email
                .clone()
                .unwrap_or_default()
                .to_lowercase();
            let mut account = inner.accounts.remove(&old_key).unwrap_or(Account {
                user: current.user.clone(),
                password: None,
            });

            if let Some(email) = &data.email {
                account.user.email = Some(email.trim().to_lowercase());
            }
            if let Some(password) = &data.password {
                account.password = Some(password.clone());
            }
            if let Some(metadata) = &data.data {
                for (key, value) in metadata {
                    account.user.user_metadata.insert(key.clone(), value.clone());
                }
            }

            let new_key = account.user.email.clone().unwrap_or_default();
            let session = Session {
                user: account.user.clone(),
                ..current
            };
            inner.accounts.insert(new_key, account);
            inner.current = Some(session.clone());
            session
        };
        let user = session.user.clone();
        self.emit(AuthEvent::UserUpdated, Some(session));
        Ok(user)
    }

    async fn sign_in_with_otp(&self, data: &MagicLinkData) -> AuthResult<()> {
        self.take_failure()?;
        validate_email(&data.email)?;

        let key = data.email.trim().to_lowercase();
        let mut inner = self.lock();
        if !inner.accounts.contains_key(&key) {
            if data.options.should_create_user == Some(false) {
                return Err(
                    AuthError::new("otp_disabled", "Signups not allowed for otp").with_status(422),
                );
            }
            let user = new_user(&key, data.options.data.clone().unwrap_or_default());
            inner.accounts.insert(
                key.clone(),
                Account {
                    user,
                    password: None,
                },
            );
        }
        inner.outbox.push(SentEmail {
            kind: SentEmailKind::MagicLink,
            to: key,
            redirect_to: data.options.email_redirect_to.clone(),
        });
        Ok(())
    }

    async fn get_session(&self) -> AuthResult<SessionData> {
        self.take_failure()?;
        Ok(SessionData::from_session(self.lock().current.clone()))
    }

    async fn refresh_session(&self) -> AuthResult<SessionData> {
        self.take_failure()?;
        let session = {
            let mut inner = self.lock();
            let current = inner.current.clone().ok_or_else(no_session)?;
            let session = issue_session(current.user);
            inner.current = Some(session.clone());
            session
        };
        self.emit(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(SessionData::from_session(Some(session)))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}
