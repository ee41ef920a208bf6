//! In-memory datastore.
//!
//! Nothing is persisted: the tables are seeded at startup and live as long as
//! the process.

mod users;

pub use users::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

/// Shared handle to the datastore.
pub type Db = Arc<Database>;

#[derive(Debug)]
pub struct Database {
    pub users: RwLock<UserTable>,
    clicks: AtomicU64,
}

impl Default for Database {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Database {
    /// Datastore holding the demo users and a zero click count.
    pub fn seeded() -> Self {
        Self::with_users(UserTable::seeded())
    }

    pub fn with_users(users: UserTable) -> Self {
        Self {
            users: RwLock::new(users),
            clicks: AtomicU64::new(0),
        }
    }

    pub fn shared(self) -> Db {
        Arc::new(self)
    }

    pub fn clicks(&self) -> u64 {
        self.clicks.load(Ordering::SeqCst)
    }

    /// Add one click and return the new count.
    pub fn increment_clicks(&self) -> u64 {
        self.clicks.fetch_add(1, Ordering::SeqCst) + 1
    }
}
