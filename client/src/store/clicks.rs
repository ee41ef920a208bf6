//! Click counter store.

use std::sync::Arc;

use super::core::{Store, StoreState};
use super::view::Selector;
use crate::services::ClickService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClickOp {
    Fetch,
    Update,
}

pub type ClickState = StoreState<u64, ClickOp>;

/// Data slice of the click store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClicksView {
    pub clicks: u64,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl ClicksView {
    pub fn of(state: &ClickState) -> Self {
        Self {
            clicks: state.data,
            is_loading: state.loading.any(),
            error: state.error.clone(),
        }
    }
}

/// Store holding the cached click count.
#[derive(Clone)]
pub struct ClickStore {
    service: Arc<dyn ClickService>,
    store: Store<ClickState>,
}

impl ClickStore {
    pub fn new(service: Arc<dyn ClickService>) -> Self {
        Self {
            service,
            store: Store::new(ClickState::default()),
        }
    }

    pub fn state(&self) -> ClickState {
        self.store.snapshot()
    }

    pub fn clicks(&self) -> u64 {
        self.store.read(|s| s.data)
    }

    /// Load the server's count. `None` when the request failed.
    pub async fn fetch_clicks(&self) -> Option<u64> {
        self.store
            .run(
                ClickOp::Fetch,
                "Failed to fetch clicks",
                self.service.get_clicks(),
                |s, response| s.data = response.data.clicks,
            )
            .await
            .map(|response| response.data.clicks)
    }

    /// Ask the server to increment and hold the value it answers with.
    pub async fn update_clicks(&self) -> Option<u64> {
        self.store
            .run(
                ClickOp::Update,
                "Failed to update clicks",
                self.service.update_clicks(),
                |s, response| s.data = response.data.clicks,
            )
            .await
            .map(|response| response.data.clicks)
    }

    pub fn set_clicks(&self, clicks: u64) {
        self.store.modify(|s| s.data = clicks);
    }

    pub fn clear_error(&self) {
        self.store.modify(|s| s.error = None);
    }

    pub fn clicks_view(&self) -> Selector<ClickState, ClicksView> {
        self.store.select(ClicksView::of)
    }

    pub fn loading_view(&self) -> Selector<ClickState, bool> {
        self.store.select(|s: &ClickState| s.loading.any())
    }
}

impl std::fmt::Debug for ClickStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickStore")
            .field("state", &self.store.snapshot())
            .finish()
    }
}
