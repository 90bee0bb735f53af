//! Joinable work queue shared by the two pipeline stages.
//!
//! Every `put` raises an unfinished-item count; every claimed item lowers it
//! exactly once, when its [`Claimed`] guard is dropped. `join` returns when
//! the count reaches zero, i.e. when every item ever enqueued has been both
//! claimed and acknowledged, not merely when the queue looks empty.

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct State<T> {
    items: VecDeque<T>,
    unfinished: usize,
}

pub struct JoinQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
    drained: Condvar,
}

impl<T> Default for JoinQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JoinQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                unfinished: 0,
            }),
            available: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    // Critical sections never panic, so a poisoned lock still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue an item and wake one waiting consumer.
    pub fn put(&self, item: T) {
        let mut state = self.lock();
        state.items.push_back(item);
        state.unfinished += 1;
        drop(state);
        self.available.notify_one();
    }

    /// Claim the front item without blocking. `None` means the queue is empty.
    pub fn try_claim(&self) -> Option<Claimed<'_, T>> {
        let item = self.lock().items.pop_front()?;
        Some(Claimed::new(self, item))
    }

    /// Claim the front item, waiting up to `timeout` for one to arrive.
    pub fn claim_timeout(&self, timeout: Duration) -> Option<Claimed<'_, T>> {
        let state = self.lock();
        let (mut state, _) = self
            .available
            .wait_timeout_while(state, timeout, |s| s.items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        let item = state.items.pop_front()?;
        drop(state);
        Some(Claimed::new(self, item))
    }

    /// Block until every enqueued item has been acknowledged.
    pub fn join(&self) {
        let state = self.lock();
        let _state = self
            .drained
            .wait_while(state, |s| s.unfinished > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`join`](Self::join) but gives up after `timeout`. Returns true if drained.
    pub fn join_timeout(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .drained
            .wait_timeout_while(state, timeout, |s| s.unfinished > 0)
            .unwrap_or_else(PoisonError::into_inner);
        state.unfinished == 0
    }

    /// Items enqueued but not yet acknowledged (queued or in flight).
    pub fn unfinished(&self) -> usize {
        self.lock().unfinished
    }

    /// Items waiting to be claimed.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn task_done(&self) {
        let mut state = self.lock();
        state.unfinished = state.unfinished.saturating_sub(1);
        let drained = state.unfinished == 0;
        drop(state);
        if drained {
            self.drained.notify_all();
        }
    }
}

/// A claimed queue item. Dropping it acknowledges the item to `join`.
///
/// Holding the acknowledgment in `Drop` means an early return or a panic in
/// the worker still releases the item.
pub struct Claimed<'q, T> {
    queue: &'q JoinQueue<T>,
    item: T,
}

impl<'q, T> Claimed<'q, T> {
    fn new(queue: &'q JoinQueue<T>, item: T) -> Self {
        Self { queue, item }
    }

    /// Acknowledge the item now. Same as dropping the guard.
    pub fn done(self) {}
}

impl<T> Deref for Claimed<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> Drop for Claimed<'_, T> {
    fn drop(&mut self) {
        self.queue.task_done();
    }
}
