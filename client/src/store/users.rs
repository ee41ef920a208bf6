//! Users store - client-side cache of the `users` resource.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::core::{Store, StoreState};
use super::view::Selector;
use crate::services::UserService;
use crate::types::{CreateUserRequest, UpdateUserRequest, User, UserId, UserQuery};

/// Operation kinds with their own loading flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserOp {
    Fetch,
    Search,
    Create,
    Update,
    Delete,
}

/// Held users data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserData {
    pub users: Vec<User>,
    pub selected_user: Option<User>,
    pub total: u64,
}

pub type UserState = StoreState<UserData, UserOp>;

/// Data slice: the list and its bookkeeping, without the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct UsersView {
    pub users: Vec<User>,
    pub total: u64,
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Loading-flags slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserLoading {
    pub is_loading: bool,
    pub is_creating: bool,
    pub is_updating: bool,
    pub is_deleting: bool,
}

impl UserLoading {
    pub fn of(state: &UserState) -> Self {
        Self {
            is_loading: state.loading.is_set(UserOp::Fetch) || state.loading.is_set(UserOp::Search),
            is_creating: state.loading.is_set(UserOp::Create),
            is_updating: state.loading.is_set(UserOp::Update),
            is_deleting: state.loading.is_set(UserOp::Delete),
        }
    }
}

impl UsersView {
    pub fn of(state: &UserState) -> Self {
        Self {
            users: state.data.users.clone(),
            total: state.data.total,
            is_loading: UserLoading::of(state).is_loading,
            error: state.error.clone(),
            last_updated: state.last_updated,
        }
    }
}

/// Store for the users resource.
///
/// Cloning yields another handle to the same state; a clone is also the
/// actions-only view, since actions never trigger re-reads by themselves.
#[derive(Clone)]
pub struct UserStore {
    service: Arc<dyn UserService>,
    store: Store<UserState>,
}

impl UserStore {
    pub fn new(service: Arc<dyn UserService>) -> Self {
        Self {
            service,
            store: Store::new(UserState::default()),
        }
    }

    /// Clone of the full state.
    pub fn state(&self) -> UserState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<UserState> {
        self.store.subscribe()
    }

    /// Replace the whole list and total.
    pub async fn fetch_users(&self) {
        self.store
            .run(
                UserOp::Fetch,
                "Failed to fetch users",
                self.service.get_users(),
                |s, response| {
                    s.data.users = response.data.clone();
                    s.data.total = response.total.unwrap_or(response.data.len() as u64);
                },
            )
            .await;
    }

    /// Refresh one user in place and select it. A user missing from the held
    /// list is selected but not inserted.
    pub async fn fetch_user_by_id(&self, id: UserId) {
        self.store
            .run(
                UserOp::Fetch,
                "Failed to fetch user",
                self.service.get_user_by_id(id),
                |s, response| {
                    let user = &response.data;
                    if let Some(held) = s.data.users.iter_mut().find(|u| u.id == user.id) {
                        *held = user.clone();
                    }
                    s.data.selected_user = Some(user.clone());
                },
            )
            .await;
    }

    /// Create a user and append it to the held list.
    pub async fn create_user(&self, request: CreateUserRequest) -> Option<User> {
        self.store
            .run(
                UserOp::Create,
                "Failed to create user",
                self.service.create_user(&request),
                |s, response| {
                    s.data.users.push(response.data.clone());
                    s.data.total += 1;
                },
            )
            .await
            .map(|response| response.data)
    }

    /// Update a user and replace it in the list and the selection.
    pub async fn update_user(&self, id: UserId, request: UpdateUserRequest) -> Option<User> {
        self.store
            .run(
                UserOp::Update,
                "Failed to update user",
                self.service.update_user(id, &request),
                |s, response| {
                    let updated = &response.data;
                    for user in s.data.users.iter_mut().filter(|u| u.id == id) {
                        *user = updated.clone();
                    }
                    if s.data.selected_user.as_ref().is_some_and(|u| u.id == id) {
                        s.data.selected_user = Some(updated.clone());
                    }
                },
            )
            .await
            .map(|response| response.data)
    }

    /// Delete a user. Returns whether the server accepted the deletion.
    pub async fn delete_user(&self, id: UserId) -> bool {
        self.store
            .run(
                UserOp::Delete,
                "Failed to delete user",
                self.service.delete_user(id),
                |s, _| {
                    s.data.users.retain(|u| u.id != id);
                    if s.data.selected_user.as_ref().is_some_and(|u| u.id == id) {
                        s.data.selected_user = None;
                    }
                    s.data.total = s.data.total.saturating_sub(1);
                },
            )
            .await
            .is_some()
    }

    /// Replace the list with the users matching `query`.
    pub async fn search_users(&self, query: UserQuery) {
        self.store
            .run(
                UserOp::Search,
                "Failed to search users",
                self.service.search_users(&query),
                |s, response| {
                    s.data.users = response.data.clone();
                    s.data.total = response.total.unwrap_or(response.data.len() as u64);
                },
            )
            .await;
    }

    pub fn select_user(&self, user: Option<User>) {
        self.store.modify(|s| s.data.selected_user = user);
    }

    pub fn clear_error(&self) {
        self.store.modify(|s| s.error = None);
    }

    /// Forget every held user.
    pub fn clear_users(&self) {
        self.store.modify(|s| {
            s.data = UserData::default();
            s.last_updated = None;
        });
    }

    pub fn users_view(&self) -> Selector<UserState, UsersView> {
        self.store.select(UsersView::of)
    }

    pub fn selected_view(&self) -> Selector<UserState, Option<User>> {
        self.store.select(|s: &UserState| s.data.selected_user.clone())
    }

    pub fn loading_view(&self) -> Selector<UserState, UserLoading> {
        self.store.select(UserLoading::of)
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("state", &self.store.snapshot())
            .finish()
    }
}
