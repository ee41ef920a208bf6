//! # Vibe Client
//!
//! Typed access to the Vibe backend plus the observable state the UI renders
//! from.
//!
//! ## Layers
//!
//! - [`api::ApiClient`] - JSON over HTTP against `{base_url}{prefix}`, with
//!   non-2xx answers turned into [`Error`] values carrying the server message
//! - [`services`] - one trait per resource ([`UserService`],
//!   [`ClickService`]) and an HTTP implementation of each
//! - [`store`] - [`UserStore`], [`ClickStore`] and [`AuthStore`]: cached
//!   state, async actions, and change-filtered [`Selector`] views
//! - [`auth`] - the [`IdentityProvider`] seam and an in-memory provider
//!
//! Store actions never return transport errors. A failed action leaves the
//! held data untouched and records the message in the store's `error` field.
//! Auth actions are the exception: they hand the provider's [`AuthError`]
//! back to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vibe_client::{AppContext, ClientConfig, MemoryIdentityProvider};
//!
//! # async fn demo() {
//! let ctx = AppContext::new(
//!     ClientConfig::default(),
//!     Arc::new(MemoryIdentityProvider::new()),
//! );
//!
//! ctx.users.fetch_users().await;
//! let view = ctx.users.users_view().get();
//! println!("{} users, error: {:?}", view.total, view.error);
//!
//! if let Some(clicks) = ctx.clicks.update_clicks().await {
//!     println!("clicked {clicks} times");
//! }
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod services;
pub mod store;
pub mod types;

pub use api::ApiClient;
pub use auth::{
    AuthChange, AuthEvent, AuthUser, Credentials, IdentityProvider, MemoryIdentityProvider,
    Session, SessionData,
};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{AuthError, AuthResult, ConfigError, Error, Result};
pub use services::{ClickService, HttpClickService, HttpUserService, UserService};
pub use store::{
    AuthState, AuthStore, AuthSubscription, AuthView, ClickState, ClickStore, ClicksView,
    Selector, UserLoading, UserState, UserStore, UsersView,
};
pub use types::{
    ApiResponse, Clicks, CreateUserRequest, UpdateUserRequest, User, UserId, UserQuery, UserStats,
};
