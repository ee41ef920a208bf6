//! Observable client-side state.
//!
//! Each store holds the latest known server state for one resource and
//! exposes async actions that call a service and merge the outcome. Reading
//! is synchronous; observers subscribe to the underlying watch channel or to
//! a [`Selector`] over the slice they need.

mod auth;
mod clicks;
mod core;
mod users;
mod view;

pub use self::auth::{AuthOp, AuthState, AuthStore, AuthSubscription, AuthView, PersistedAuth};
pub use self::clicks::{ClickOp, ClickState, ClickStore, ClicksView};
pub use self::core::{Loading, LoadingFlags, Pending, Store, StoreState, Tracked};
pub use self::users::{UserData, UserLoading, UserOp, UserState, UserStore, UsersView};
pub use self::view::Selector;
