//! Generic store core.
//!
//! A [`Store`] owns one state value inside a `tokio::sync::watch` channel.
//! Handles are cheap to clone and all share the same state; observers get a
//! receiver and are woken on every change.
//!
//! States that track in-flight actions implement [`Loading`], and those that
//! also carry an error and a last-updated stamp implement [`Tracked`]. For
//! those, [`Store::run`] drives one action through
//! `idle -> pending -> (success | failed)`:
//!
//! - pending: the op's loading flag is set and any previous error cleared
//! - success: the result is merged, `last_updated` stamped, the flag cleared
//! - failed: the error message is stored, the flag cleared, data untouched
//!
//! Completion is applied in a single state update. No request sequencing is
//! done: when two actions overlap, whichever completes last wins.

use std::collections::BTreeSet;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::view::Selector;
use crate::error::display_message;

/// States with per-operation loading flags.
pub trait Loading {
    type Op: Copy + Debug + Send + Sync;

    fn set_loading(&mut self, op: Self::Op, loading: bool);
}

/// States that also keep an error message and a last-updated stamp.
pub trait Tracked: Loading {
    fn set_error(&mut self, error: Option<String>);

    fn mark_updated(&mut self, at: DateTime<Utc>);
}

/// Set of operation kinds currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingFlags<O: Ord> {
    active: BTreeSet<O>,
}

impl<O: Ord> Default for LoadingFlags<O> {
    fn default() -> Self {
        Self {
            active: BTreeSet::new(),
        }
    }
}

impl<O: Ord + Copy> LoadingFlags<O> {
    pub fn set(&mut self, op: O, loading: bool) {
        if loading {
            self.active.insert(op);
        } else {
            self.active.remove(&op);
        }
    }

    pub fn is_set(&self, op: O) -> bool {
        self.active.contains(&op)
    }

    /// Whether any operation is in flight.
    pub fn any(&self) -> bool {
        !self.active.is_empty()
    }
}

/// State of a resource store: held data plus action bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<D, O: Ord> {
    pub data: D,
    pub error: Option<String>,
    pub loading: LoadingFlags<O>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<D, O: Ord> StoreState<D, O> {
    pub fn new(data: D) -> Self {
        Self {
            data,
            error: None,
            loading: LoadingFlags::default(),
            last_updated: None,
        }
    }
}

impl<D: Default, O: Ord> Default for StoreState<D, O> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

impl<D, O: Ord + Copy + Debug + Send + Sync> Loading for StoreState<D, O> {
    type Op = O;

    fn set_loading(&mut self, op: O, loading: bool) {
        self.loading.set(op, loading);
    }
}

impl<D, O: Ord + Copy + Debug + Send + Sync> Tracked for StoreState<D, O> {
    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    fn mark_updated(&mut self, at: DateTime<Utc>) {
        self.last_updated = Some(at);
    }
}

/// Shared, observable state container.
#[derive(Debug)]
pub struct Store<S> {
    state: Arc<watch::Sender<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: Send + Sync + 'static> Store<S> {
    pub fn new(initial: S) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state: Arc::new(state),
        }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.state.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Apply `f` to the state and notify observers.
    pub fn modify(&self, f: impl FnOnce(&mut S)) {
        self.state.send_modify(f);
    }

    /// A receiver woken on every state change.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    /// A selector over the slice `project` picks out.
    pub fn select<T, F>(&self, project: F) -> Selector<S, T>
    where
        T: Clone + PartialEq,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        Selector::new(self.subscribe(), project)
    }
}

impl<S: Loading + Send + Sync + 'static> Store<S> {
    /// Mark `op` as in flight.
    pub fn pending(&self, op: S::Op) -> Pending<'_, S> {
        self.pending_with(op, |_| {})
    }

    /// Mark `op` as in flight, applying `prepare` in the same update.
    pub fn pending_with(&self, op: S::Op, prepare: impl FnOnce(&mut S)) -> Pending<'_, S> {
        self.modify(|s| {
            prepare(s);
            s.set_loading(op, true);
        });
        Pending {
            store: self,
            op,
            armed: true,
        }
    }
}

impl<S: Tracked + Send + Sync + 'static> Store<S> {
    /// Drive one action and merge its outcome.
    ///
    /// Returns `Some(value)` on success. On failure the error's message (or
    /// `fallback` when it has none) is stored in the state and `None` is
    /// returned; the failure never propagates past the store.
    pub async fn run<T, E, Fut, M>(&self, op: S::Op, fallback: &str, call: Fut, merge: M) -> Option<T>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        M: FnOnce(&mut S, &T),
    {
        let pending = self.pending_with(op, |s| s.set_error(None));

        match call.await {
            Ok(value) => {
                pending.finish(|s| {
                    merge(s, &value);
                    s.mark_updated(Utc::now());
                });
                Some(value)
            }
            Err(err) => {
                let message = display_message(&err, fallback);
                tracing::warn!(?op, error = %message, "store action failed");
                pending.finish(|s| s.set_error(Some(message)));
                None
            }
        }
    }
}

/// An in-flight operation.
///
/// [`Pending::finish`] clears the loading flag together with the final state
/// update. If the guard is dropped unfinished (the action future was
/// cancelled) the flag is cleared on drop.
#[must_use = "dropping a Pending immediately clears its loading flag"]
pub struct Pending<'a, S: Loading + Send + Sync + 'static> {
    store: &'a Store<S>,
    op: S::Op,
    armed: bool,
}

impl<S: Loading + Send + Sync + 'static> Pending<'_, S> {
    /// Apply the final update and clear the loading flag.
    pub fn finish(mut self, f: impl FnOnce(&mut S)) {
        self.armed = false;
        let op = self.op;
        self.store.modify(|s| {
            f(s);
            s.set_loading(op, false);
        });
    }
}

impl<S: Loading + Send + Sync + 'static> Drop for Pending<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            let op = self.op;
            self.store.modify(|s| s.set_loading(op, false));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Op {
        Load,
        Save,
    }

    type State = StoreState<Vec<u32>, Op>;

    #[tokio::test]
    async fn run_success_merges_and_stamps() {
        let store = Store::new(State::default());
        let out = store
            .run(Op::Load, "failed", async { Ok::<_, String>(vec![1, 2]) }, |s, v| {
                s.data = v.clone()
            })
            .await;

        assert_eq!(out, Some(vec![1, 2]));
        let state = store.snapshot();
        assert_eq!(state.data, vec![1, 2]);
        assert!(state.error.is_none());
        assert!(state.last_updated.is_some());
        assert!(!state.loading.any());
    }

    #[tokio::test]
    async fn run_failure_keeps_data() {
        let store = Store::new(State::new(vec![7]));
        let out = store
            .run(Op::Load, "failed", async { Err::<Vec<u32>, _>("boom") }, |s, v| {
                s.data = v.clone()
            })
            .await;

        assert_eq!(out, None);
        let state = store.snapshot();
        assert_eq!(state.data, vec![7]);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(state.last_updated.is_none());
        assert!(!state.loading.is_set(Op::Load));
    }

    #[tokio::test]
    async fn run_failure_with_empty_message_uses_fallback() {
        let store = Store::new(State::default());
        store
            .run(Op::Save, "Failed to save", async { Err::<(), _>("") }, |_, _| {})
            .await;
        assert_eq!(store.snapshot().error.as_deref(), Some("Failed to save"));
    }

    #[tokio::test]
    async fn new_action_clears_previous_error() {
        let store = Store::new(State::default());
        store.modify(|s| s.error = Some("old".into()));

        let mut rx = store.subscribe();
        let (tx, call_rx) = tokio::sync::oneshot::channel::<Result<Vec<u32>, String>>();
        let action = store.run(
            Op::Load,
            "failed",
            async move { call_rx.await.unwrap() },
            |s, v| s.data = v.clone(),
        );
        tokio::pin!(action);

        // Poll the action once so it enters pending.
        tokio::select! {
            biased;
            _ = &mut action => panic!("action resolved early"),
            _ = rx.changed() => {}
        }
        {
            let state = rx.borrow_and_update();
            assert!(state.error.is_none());
            assert!(state.loading.is_set(Op::Load));
        }

        tx.send(Ok(vec![3])).unwrap();
        action.await;
        assert!(!store.snapshot().loading.any());
    }

    #[tokio::test]
    async fn dropped_action_clears_flag() {
        let store = Store::new(State::default());
        {
            let pending = store.pending(Op::Save);
            assert!(store.read(|s| s.loading.is_set(Op::Save)));
            drop(pending);
        }
        assert!(!store.read(|s| s.loading.any()));
    }

    #[test]
    fn loading_flags_are_per_op() {
        let mut flags = LoadingFlags::default();
        flags.set(Op::Load, true);
        flags.set(Op::Save, true);
        flags.set(Op::Load, false);
        assert!(!flags.is_set(Op::Load));
        assert!(flags.is_set(Op::Save));
        assert!(flags.any());
    }
}
