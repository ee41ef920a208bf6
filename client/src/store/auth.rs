//! Auth session store.
//!
//! A read cache of the identity provider's session plus a subscriber to the
//! provider's change channel. Every action sets the loading flag, calls the
//! provider, and on success updates `user`, `session` and
//! `is_authenticated` together from the same response. Provider errors are
//! returned untouched. The loading flag is cleared by a guard, so it is reset
//! on success, on failure and when the action is cancelled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::core::{Loading, Store};
use super::view::Selector;
use crate::auth::{
    AuthUser, Credentials, IdentityProvider, MagicLinkData, OAuthCredentials, ResetPasswordData,
    Session, SessionData, SignUpCredentials, UpdatePasswordData, UpdateUserData,
};
use crate::error::AuthResult;

/// Provider calls the store can have in flight. They share one loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOp {
    Login,
    OAuthLogin,
    SignUp,
    Logout,
    ResetPassword,
    UpdatePassword,
    UpdateUser,
    MagicLink,
    GetSession,
    RefreshSession,
    Initialize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub is_initialized: bool,
}

impl AuthState {
    /// Everything empty but initialized.
    fn signed_out() -> Self {
        Self {
            is_initialized: true,
            ..Self::default()
        }
    }

    /// Take session and user from one session value.
    fn apply_session(&mut self, session: Option<Session>) {
        self.user = session.as_ref().map(|s| s.user.clone());
        self.is_authenticated = self.user.is_some();
        self.session = session;
    }

    fn apply_session_data(&mut self, data: &SessionData) {
        self.session = data.session.clone();
        self.user = data.user.clone();
        self.is_authenticated = self.user.is_some();
    }
}

impl Loading for AuthState {
    type Op = AuthOp;

    fn set_loading(&mut self, _op: AuthOp, loading: bool) {
        self.is_loading = loading;
    }
}

/// The part of the auth state worth keeping across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAuth {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
    pub is_authenticated: bool,
}

/// Slice used by route guards and the header widget.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthView {
    pub user: Option<AuthUser>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub is_initialized: bool,
}

impl AuthView {
    pub fn of(state: &AuthState) -> Self {
        Self {
            user: state.user.clone(),
            is_authenticated: state.is_authenticated,
            is_loading: state.is_loading,
            is_initialized: state.is_initialized,
        }
    }
}

/// Handle to the session-change listener started by
/// [`AuthStore::initialize_auth`]. Dropping it stops the listener.
#[derive(Debug)]
pub struct AuthSubscription {
    task: JoinHandle<()>,
}

impl AuthSubscription {
    /// Stop applying provider-pushed changes.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Clone)]
pub struct AuthStore {
    provider: Arc<dyn IdentityProvider>,
    store: Store<AuthState>,
}

impl AuthStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            store: Store::new(AuthState::default()),
        }
    }

    pub fn state(&self) -> AuthState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<AuthState> {
        self.store.subscribe()
    }

    pub fn auth_view(&self) -> Selector<AuthState, AuthView> {
        self.store.select(AuthView::of)
    }

    pub fn set_loading(&self, loading: bool) {
        self.store.modify(|s| s.is_loading = loading);
    }

    pub fn set_user(&self, user: Option<AuthUser>) {
        self.store.modify(|s| {
            s.is_authenticated = user.is_some();
            s.user = user;
        });
    }

    pub fn set_session(&self, session: Option<Session>) {
        self.store.modify(|s| s.apply_session(session));
    }

    /// Empty the store but keep it marked initialized, so consumers do not
    /// fall back to a loading state.
    pub fn reset(&self) {
        self.store.modify(|s| *s = AuthState::signed_out());
    }

    pub async fn login(&self, credentials: &Credentials) -> AuthResult<Session> {
        let pending = self.store.pending(AuthOp::Login);
        let result = self.provider.sign_in_with_password(credentials).await;
        match &result {
            Ok(session) => pending.finish(|s| s.apply_session(Some(session.clone()))),
            Err(err) => {
                tracing::warn!(code = %err.code, error = %err, "login failed");
                pending.finish(|_| {});
            }
        }
        result
    }

    pub async fn login_with_oauth(&self, credentials: &OAuthCredentials) -> AuthResult<()> {
        let pending = self.store.pending(AuthOp::OAuthLogin);
        let result = self.provider.sign_in_with_oauth(credentials).await;
        if let Err(err) = &result {
            tracing::warn!(code = %err.code, error = %err, "OAuth login failed");
        }
        pending.finish(|_| {});
        result
    }

    pub async fn sign_up(&self, credentials: &SignUpCredentials) -> AuthResult<Option<Session>> {
        let pending = self.store.pending(AuthOp::SignUp);
        let result = self.provider.sign_up(credentials).await;
        match &result {
            Ok(Some(session)) => pending.finish(|s| s.apply_session(Some(session.clone()))),
            Ok(None) => pending.finish(|_| {}),
            Err(err) => {
                tracing::warn!(code = %err.code, error = %err, "sign-up failed");
                pending.finish(|_| {});
            }
        }
        result
    }

    /// Sign out and reset the store.
    pub async fn logout(&self) -> AuthResult<()> {
        let pending = self.store.pending(AuthOp::Logout);
        let result = self.provider.sign_out().await;
        match &result {
            Ok(()) => pending.finish(|s| *s = AuthState::signed_out()),
            Err(err) => {
                tracing::warn!(code = %err.code, error = %err, "logout failed");
                pending.finish(|_| {});
            }
        }
        result
    }

    pub async fn reset_password(&self, data: &ResetPasswordData) -> AuthResult<()> {
        let pending = self.store.pending(AuthOp::ResetPassword);
        let result = self.provider.reset_password_for_email(data).await;
        if let Err(err) = &result {
            tracing::warn!(code = %err.code, error = %err, "password reset failed");
        }
        pending.finish(|_| {});
        result
    }

    pub async fn update_password(&self, data: &UpdatePasswordData) -> AuthResult<AuthUser> {
        let update = UpdateUserData {
            password: Some(data.password.clone()),
            ..UpdateUserData::default()
        };
        self.update_user_with(AuthOp::UpdatePassword, &update).await
    }

    pub async fn update_user(&self, data: &UpdateUserData) -> AuthResult<AuthUser> {
        self.update_user_with(AuthOp::UpdateUser, data).await
    }

    async fn update_user_with(&self, op: AuthOp, data: &UpdateUserData) -> AuthResult<AuthUser> {
        let pending = self.store.pending(op);
        let result = self.provider.update_user(data).await;
        match &result {
            Ok(user) => pending.finish(|s| s.user = Some(user.clone())),
            Err(err) => {
                tracing::warn!(?op, code = %err.code, error = %err, "user update failed");
                pending.finish(|_| {});
            }
        }
        result
    }

    pub async fn send_magic_link(&self, data: &MagicLinkData) -> AuthResult<()> {
        let pending = self.store.pending(AuthOp::MagicLink);
        let result = self.provider.sign_in_with_otp(data).await;
        if let Err(err) = &result {
            tracing::warn!(code = %err.code, error = %err, "magic link failed");
        }
        pending.finish(|_| {});
        result
    }

    pub async fn get_session(&self) -> AuthResult<SessionData> {
        self.session_action(AuthOp::GetSession).await
    }

    pub async fn refresh_session(&self) -> AuthResult<SessionData> {
        self.session_action(AuthOp::RefreshSession).await
    }

    async fn session_action(&self, op: AuthOp) -> AuthResult<SessionData> {
        let pending = self.store.pending(op);
        let result = match op {
            AuthOp::RefreshSession => self.provider.refresh_session().await,
            _ => self.provider.get_session().await,
        };
        match &result {
            Ok(data) => pending.finish(|s| s.apply_session_data(data)),
            Err(err) => {
                tracing::warn!(?op, code = %err.code, error = %err, "session lookup failed");
                pending.finish(|_| {});
            }
        }
        result
    }

    /// Hydrate from the provider once, then follow its change channel.
    ///
    /// The store is marked initialized even when hydration fails. Must be
    /// called from within a tokio runtime.
    pub async fn initialize_auth(&self) -> AuthSubscription {
        let pending = self.store.pending(AuthOp::Initialize);

        match self.provider.get_session().await {
            Ok(data) => self.store.modify(|s| s.apply_session(data.session)),
            Err(err) => {
                tracing::warn!(code = %err.code, error = %err, "failed to hydrate auth session");
            }
        }

        let mut changes = self.provider.subscribe();
        let store = self.store.clone();
        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        tracing::debug!(event = ?change.event, "auth state changed");
                        store.modify(|s| s.apply_session(change.session));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth listener lagged behind provider");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        pending.finish(|s| s.is_initialized = true);
        AuthSubscription { task }
    }

    pub fn export_state(&self) -> PersistedAuth {
        self.store.read(|s| PersistedAuth {
            user: s.user.clone(),
            session: s.session.clone(),
            is_authenticated: s.is_authenticated,
        })
    }

    pub fn import_state(&self, persisted: PersistedAuth) {
        self.store.modify(|s| {
            s.user = persisted.user;
            s.session = persisted.session;
            s.is_authenticated = persisted.is_authenticated;
        });
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("state", &self.store.snapshot())
            .finish()
    }
}
