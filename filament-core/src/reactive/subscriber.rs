//! Subscriber types for the reactive system.
//!
//! A subscriber is anything a signal notifies on write: either a tracked
//! computation (effects and derived values) or a watch callback that
//! receives the new and previous values inline.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::effect::Computation;
use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Each computation and each watch callback gets a unique ID when created.
/// Signals key their subscriber sets by this ID, which makes subscribing
/// idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked with `(new, previous)` on every effective write.
pub type WatchFn<T> = Rc<dyn Fn(&T, &T) -> Result<()>>;

/// A subscriber registered on a signal.
pub(crate) enum Subscriber<T> {
    /// Re-run on notification, or queued while a batch is open.
    Computation(Rc<Computation>),
    /// Called inline during `set`, bypassing batches.
    Watch(WatchFn<T>),
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Computation(computation) => Self::Computation(Rc::clone(computation)),
            Self::Watch(callback) => Self::Watch(Rc::clone(callback)),
        }
    }
}

/// Anything a computation can be subscribed to.
///
/// Computations keep weak handles to their sources so disposal can
/// deregister them without keeping the sources alive.
pub(crate) trait Source {
    fn unsubscribe(&self, id: SubscriberId);
}
