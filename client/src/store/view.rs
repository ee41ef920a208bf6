//! Derived views over store state.
//!
//! A [`Selector`] narrows a store's full state to the slice a consumer cares
//! about and only reports a change when that slice differs, so unrelated
//! updates (another resource's loading flag, a cleared error) do not wake it.

use std::fmt;

use tokio::sync::watch;

type Projection<S, T> = Box<dyn Fn(&S) -> T + Send + Sync>;

/// Projected, change-filtered view of a store.
pub struct Selector<S, T> {
    rx: watch::Receiver<S>,
    project: Projection<S, T>,
    last: T,
}

impl<S, T: Clone + PartialEq> Selector<S, T> {
    pub fn new<F>(mut rx: watch::Receiver<S>, project: F) -> Self
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let last = project(&rx.borrow_and_update());
        Self {
            rx,
            project: Box::new(project),
            last,
        }
    }

    /// The slice as of the latest state.
    pub fn get(&self) -> T {
        (self.project)(&self.rx.borrow())
    }

    /// Wait until the slice differs from the one last returned.
    ///
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            self.rx.changed().await.ok()?;
            let next = (self.project)(&self.rx.borrow_and_update());
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}

impl<S, T: fmt::Debug> fmt::Debug for Selector<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector").field("last", &self.last).finish()
    }
}
