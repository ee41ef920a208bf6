//! Resource store behaviour against in-process fake services.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use vibe_client::error::Result;
use vibe_client::store::{UserLoading, UsersView};
use vibe_client::types::{ClicksResponse, UserResponse, UserStatsResponse, UsersResponse};
use vibe_client::{
    ApiResponse, ClickService, ClickStore, Clicks, CreateUserRequest, Error, UpdateUserRequest,
    User, UserId, UserQuery, UserService, UserStats, UserStore,
};

fn user(id: UserId, name: &str, email: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
}

fn seed() -> Vec<User> {
    vec![
        user(1, "Joao Silva", "joao@example.com"),
        user(2, "Maria Santos", "maria@example.com"),
        user(3, "Pedro Oliveira", "pedro@example.com"),
    ]
}

/// Users service over a plain vector. `get_users` can be held back with a
/// gate so tests choose the order in which overlapping calls resolve.
#[derive(Default)]
struct FakeUsers {
    users: Mutex<Vec<User>>,
    fail_next: Mutex<Option<Error>>,
    gates: Mutex<VecDeque<oneshot::Receiver<Vec<User>>>>,
}

impl FakeUsers {
    fn seeded() -> Arc<Self> {
        let fake = Self::default();
        *fake.users.lock().unwrap() = seed();
        Arc::new(fake)
    }

    fn fail_next(&self, err: Error) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    fn gate(&self) -> oneshot::Sender<Vec<User>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    fn next_gate(&self) -> Option<oneshot::Receiver<Vec<User>>> {
        self.gates.lock().unwrap().pop_front()
    }

    fn current(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found() -> Error {
        Error::NotFound("User not found".to_string())
    }
}

#[async_trait]
impl UserService for FakeUsers {
    async fn get_users(&self) -> Result<UsersResponse> {
        self.check()?;
        let users = match self.next_gate() {
            Some(gate) => gate.await.unwrap(),
            None => self.current(),
        };
        let total = users.len() as u64;
        Ok(ApiResponse::new(users).with_total(total))
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<UserResponse> {
        self.check()?;
        let users = self.users.lock().unwrap();
        let found = users.iter().find(|u| u.id == id).cloned();
        found.map(ApiResponse::new).ok_or_else(Self::not_found)
    }

    async fn create_user(&self, request: &CreateUserRequest) -> Result<UserResponse> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let email = request.email.trim().to_lowercase();
        if users.iter().any(|u| u.email == email) {
            return Err(Error::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let created = user(id, request.name.trim(), &email);
        users.push(created.clone());
        Ok(ApiResponse::new(created))
    }

    async fn update_user(&self, id: UserId, request: &UpdateUserRequest) -> Result<UserResponse> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let held = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(Self::not_found)?;
        if let Some(name) = &request.name {
            held.name = name.clone();
        }
        if let Some(email) = &request.email {
            held.email = email.clone();
        }
        Ok(ApiResponse::new(held.clone()))
    }

    async fn delete_user(&self, id: UserId) -> Result<ApiResponse<User>> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(Self::not_found)?;
        Ok(ApiResponse::new(users.remove(index)))
    }

    async fn search_users(&self, query: &UserQuery) -> Result<UsersResponse> {
        self.check()?;
        let needle = query.name.clone().unwrap_or_default().to_lowercase();
        let found: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        let total = found.len() as u64;
        Ok(ApiResponse::new(found).with_total(total))
    }

    async fn get_user_stats(&self) -> Result<UserStatsResponse> {
        self.check()?;
        Ok(ApiResponse::new(UserStats {
            total_users: self.users.lock().unwrap().len() as u64,
            email_domains: Default::default(),
            most_common_domain: None,
            average_name_length: 0,
        }))
    }
}

#[derive(Default)]
struct FakeClicks {
    clicks: Mutex<u64>,
    fail_next: Mutex<Option<Error>>,
}

#[async_trait]
impl ClickService for FakeClicks {
    async fn get_clicks(&self) -> Result<ClicksResponse> {
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        let clicks = *self.clicks.lock().unwrap();
        Ok(ApiResponse::new(Clicks { clicks }))
    }

    async fn update_clicks(&self) -> Result<ClicksResponse> {
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        let mut clicks = self.clicks.lock().unwrap();
        *clicks += 1;
        Ok(ApiResponse::new(Clicks { clicks: *clicks }))
    }
}

// --- users: fetch ---

#[tokio::test]
async fn fetch_users_loads_list_and_total() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;

    let state = store.state();
    assert_eq!(state.data.users.len(), 3);
    assert_eq!(state.data.total, 3);
    assert!(state.error.is_none());
    assert!(state.last_updated.is_some());
    assert_eq!(UserLoading::of(&state), UserLoading::default());
}

#[tokio::test]
async fn fetch_twice_keeps_data_and_advances_stamp() {
    let store = UserStore::new(FakeUsers::seeded());

    store.fetch_users().await;
    let first = store.state();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.fetch_users().await;
    let second = store.state();

    assert_eq!(first.data, second.data);
    assert!(second.last_updated.unwrap() > first.last_updated.unwrap());
}

#[tokio::test]
async fn failed_fetch_keeps_data_and_records_message() {
    let service = FakeUsers::seeded();
    let store = UserStore::new(service.clone());
    store.fetch_users().await;
    let before = store.state();

    service.fail_next(Error::Http { status: 500 });
    store.fetch_users().await;

    let after = store.state();
    assert_eq!(after.data, before.data);
    assert_eq!(after.last_updated, before.last_updated);
    assert_eq!(after.error.as_deref(), Some("HTTP error: 500"));
    assert!(!after.loading.any());
}

#[tokio::test]
async fn next_action_clears_error() {
    let service = FakeUsers::seeded();
    let store = UserStore::new(service.clone());

    service.fail_next(Error::Transport("refused".to_string()));
    store.fetch_users().await;
    assert_eq!(store.state().error.as_deref(), Some("refused"));

    store.fetch_users().await;
    assert!(store.state().error.is_none());
}

#[tokio::test]
async fn overlapping_fetches_last_resolved_wins() {
    let service = FakeUsers::seeded();
    let store = UserStore::new(service.clone());

    let first = service.gate();
    let second = service.gate();

    let mut rx = store.subscribe();
    tokio::join!(store.fetch_users(), store.fetch_users(), async {
        second.send(vec![user(9, "Late", "late@x.com")]).unwrap();
        rx.wait_for(|s| s.data.users.first().map(|u| u.id) == Some(9))
            .await
            .unwrap();
        first.send(seed()).unwrap();
    });

    // The first request resolved last, so its answer is held.
    let state = store.state();
    assert_eq!(state.data.users, seed());
    assert_eq!(state.data.total, 3);
}

#[tokio::test]
async fn fetch_user_by_id_refreshes_and_selects() {
    let service = FakeUsers::seeded();
    let store = UserStore::new(service.clone());
    store.fetch_users().await;

    service.users.lock().unwrap()[1].name = "Maria S.".to_string();
    store.fetch_user_by_id(2).await;

    let state = store.state();
    assert_eq!(state.data.users[1].name, "Maria S.");
    assert_eq!(state.data.selected_user.unwrap().name, "Maria S.");
}

#[tokio::test]
async fn fetch_unknown_user_selects_nothing() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_user_by_id(42).await;

    let state = store.state();
    assert!(state.data.selected_user.is_none());
    assert_eq!(state.error.as_deref(), Some("User not found"));
}

#[tokio::test]
async fn fetch_user_outside_list_is_selected_not_inserted() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_user_by_id(2).await;

    let state = store.state();
    assert!(state.error.is_none());
    assert!(state.data.users.is_empty());
    assert_eq!(state.data.total, 0);
    assert_eq!(state.data.selected_user.map(|u| u.id), Some(2));
}

// --- users: mutations ---

#[tokio::test]
async fn create_appends_and_counts() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;

    let created = store
        .create_user(CreateUserRequest::new("Ana", "ANA@X.com"))
        .await
        .unwrap();

    assert_eq!(created.id, 4);
    assert_eq!(created.email, "ana@x.com");
    let state = store.state();
    assert_eq!(state.data.users.last(), Some(&created));
    assert_eq!(state.data.total, 4);
}

#[tokio::test]
async fn create_conflict_leaves_list() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;

    let created = store
        .create_user(CreateUserRequest::new("Maria", "maria@example.com"))
        .await;

    assert!(created.is_none());
    let state = store.state();
    assert_eq!(state.data.users.len(), 3);
    assert_eq!(
        state.error.as_deref(),
        Some("A user with this email already exists")
    );
}

#[tokio::test]
async fn update_replaces_in_list_and_selection() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;
    store.select_user(Some(user(1, "Joao Silva", "joao@example.com")));

    let updated = store
        .update_user(1, UpdateUserRequest::name("Joana"))
        .await
        .unwrap();

    assert_eq!(updated.email, "joao@example.com");
    let state = store.state();
    assert_eq!(state.data.users[0].name, "Joana");
    assert_eq!(state.data.selected_user.unwrap().name, "Joana");
}

#[tokio::test]
async fn update_leaves_other_selection_alone() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;
    let selected = user(3, "Pedro Oliveira", "pedro@example.com");
    store.select_user(Some(selected.clone()));

    store.update_user(1, UpdateUserRequest::name("Joana")).await;

    assert_eq!(store.state().data.selected_user, Some(selected));
}

#[tokio::test]
async fn delete_removes_and_clears_selection() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;
    store.select_user(Some(user(2, "Maria Santos", "maria@example.com")));

    assert!(store.delete_user(2).await);

    let state = store.state();
    let ids: Vec<UserId> = state.data.users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(state.data.total, 2);
    assert!(state.data.selected_user.is_none());
}

#[tokio::test]
async fn delete_missing_user_changes_nothing_but_error() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;
    let before = store.state();

    assert!(!store.delete_user(99).await);

    let after = store.state();
    assert_eq!(after.data, before.data);
    assert_eq!(after.error.as_deref(), Some("User not found"));
}

#[tokio::test]
async fn delete_without_loaded_list_keeps_total_at_zero() {
    let store = UserStore::new(FakeUsers::seeded());
    let selected = user(3, "Pedro Oliveira", "pedro@example.com");
    store.select_user(Some(selected.clone()));

    assert!(store.delete_user(1).await);

    let state = store.state();
    assert!(state.error.is_none());
    assert_eq!(state.data.total, 0);
    assert!(state.data.users.is_empty());
    assert_eq!(state.data.selected_user, Some(selected));
}

#[tokio::test]
async fn search_replaces_list() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;

    store
        .search_users(UserQuery {
            name: Some("mar".to_string()),
            ..UserQuery::default()
        })
        .await;

    let state = store.state();
    assert_eq!(state.data.users.len(), 1);
    assert_eq!(state.data.total, 1);
}

#[tokio::test]
async fn clear_users_forgets_everything() {
    let store = UserStore::new(FakeUsers::seeded());
    store.fetch_users().await;
    store.clear_users();

    let state = store.state();
    assert!(state.data.users.is_empty());
    assert_eq!(state.data.total, 0);
    assert!(state.last_updated.is_none());
}

// --- users: views ---

#[tokio::test]
async fn users_view_wakes_on_fetch_only() {
    let store = UserStore::new(FakeUsers::seeded());
    let mut view = store.users_view();
    let mut selected = store.selected_view();

    store.fetch_users().await;
    let seen: UsersView = view.changed().await.unwrap();
    assert_eq!(seen.users.len(), 3);

    store.select_user(Some(user(1, "Joao Silva", "joao@example.com")));
    assert_eq!(selected.changed().await.unwrap().map(|u| u.id), Some(1));

    let unchanged =
        tokio::time::timeout(Duration::from_millis(20), view.changed()).await;
    assert!(unchanged.is_err(), "users view woke on a selection change");
}

#[tokio::test]
async fn loading_view_reports_in_flight_fetch() {
    let service = FakeUsers::seeded();
    let store = UserStore::new(service.clone());
    let loading = store.loading_view();
    let gate = service.gate();

    let fetch = store.fetch_users();
    tokio::pin!(fetch);
    tokio::select! {
        biased;
        _ = &mut fetch => panic!("fetch resolved before its gate"),
        _ = tokio::task::yield_now() => {}
    }
    assert!(loading.get().is_loading);
    assert!(!loading.get().is_creating);

    gate.send(seed()).unwrap();
    fetch.await;
    assert!(!loading.get().is_loading);
}

// --- clicks ---

#[tokio::test]
async fn clicks_fetch_and_update() {
    let service = Arc::new(FakeClicks::default());
    *service.clicks.lock().unwrap() = 4;
    let store = ClickStore::new(service.clone());

    assert_eq!(store.fetch_clicks().await, Some(4));
    assert_eq!(store.update_clicks().await, Some(5));
    assert_eq!(store.clicks(), 5);
    assert!(store.state().last_updated.is_some());
}

#[tokio::test]
async fn clicks_failure_keeps_count() {
    let service = Arc::new(FakeClicks::default());
    let store = ClickStore::new(service.clone());
    store.set_clicks(7);

    *service.fail_next.lock().unwrap() = Some(Error::Http { status: 502 });
    assert_eq!(store.update_clicks().await, None);

    let view = store.clicks_view().get();
    assert_eq!(view.clicks, 7);
    assert_eq!(view.error.as_deref(), Some("HTTP error: 502"));
    assert!(!view.is_loading);

    store.clear_error();
    assert!(store.state().error.is_none());
}
