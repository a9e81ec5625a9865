//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (effect or derived
//!    value), the signal registers that computation as a subscriber. A
//!    computation subscribes at most once no matter how often it reads.
//!
//! 2. When a signal is written with a value that differs from the current
//!    one, every subscriber is visited in insertion order. Watch callbacks
//!    run inline with `(new, previous)`. Computations run immediately, or
//!    are queued when a batch is open.
//!
//! 3. While a signal is fanning out a write outside of a batch it is in
//!    "notifying" mode, and reads of it do not subscribe anyone.
//!
//! # Memory Layout
//!
//! Each signal consists of:
//! - A unique ID (8 bytes)
//! - The value, behind a `RefCell`
//! - An insertion-ordered map of subscribers

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::trace;

use super::context::ReactiveContext;
use super::runtime;
use super::subscriber::{Source, Subscriber, WatchFn};
use super::SubscriberId;
use crate::error::Result;

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct SignalInner<T> {
    id: u64,
    value: RefCell<T>,
    subscribers: RefCell<IndexMap<SubscriberId, Subscriber<T>>>,
    notifying: Cell<bool>,
}

impl<T: 'static> Source for SignalInner<T> {
    fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.borrow_mut().shift_remove(&id);
    }
}

/// Resets the notifying flag once a fan-out finishes or unwinds.
struct NotifyGuard<'a>(&'a Cell<bool>);

impl<'a> NotifyGuard<'a> {
    fn enter(flag: &'a Cell<bool>, notifying: bool) -> Self {
        flag.set(notifying);
        Self(flag)
    }
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A reactive cell holding a value of type `T`.
///
/// Clones share the same cell. Equality between signals is identity.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let value = count.get();
/// count.set(5)?;
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    inner: Rc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: next_signal_id(),
                value: RefCell::new(value),
                subscribers: RefCell::new(IndexMap::new()),
                notifying: Cell::new(false),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the current value, subscribing the running computation.
    pub fn get(&self) -> T {
        self.track();
        self.peek()
    }

    /// Get the current value without tracking.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    fn track(&self) {
        if self.inner.notifying.get() {
            return;
        }
        let Some(current) = ReactiveContext::current() else {
            return;
        };
        if current.is_disposed() {
            return;
        }

        let inserted = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            if subscribers.contains_key(&current.id()) {
                false
            } else {
                subscribers.insert(current.id(), Subscriber::Computation(Rc::clone(&current)));
                true
            }
        };

        if inserted {
            let inner: Rc<dyn Source> = self.inner.clone();
            current.add_source(Rc::downgrade(&inner));
        }
    }

    /// Write a new value and notify subscribers.
    ///
    /// Writing a value equal to the current one does nothing. The first
    /// error raised by a subscriber stops the fan-out and is returned.
    pub fn set(&self, value: T) -> Result<()> {
        let previous = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return Ok(());
            }
            std::mem::replace(&mut *current, value.clone())
        };

        let snapshot: Vec<(SubscriberId, Subscriber<T>)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(id, subscriber)| (*id, subscriber.clone()))
            .collect();

        trace!(signal = self.inner.id, subscribers = snapshot.len(), "signal changed");

        let _notifying = NotifyGuard::enter(&self.inner.notifying, !runtime::is_batching());
        for (id, subscriber) in snapshot {
            // Skip subscribers removed by an earlier one in this fan-out.
            if !self.inner.subscribers.borrow().contains_key(&id) {
                continue;
            }
            match subscriber {
                Subscriber::Watch(callback) => callback(&value, &previous)?,
                Subscriber::Computation(computation) => {
                    if runtime::is_batching() {
                        runtime::enqueue(computation);
                    } else {
                        computation.notify()?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.inner.value.borrow());
        self.set(next)
    }

    /// Register a callback that receives `(new, previous)` on every write.
    ///
    /// Watchers run inline during `set`, even inside a batch.
    pub fn watch<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&T, &T) -> Result<()> + 'static,
    {
        let id = SubscriberId::new();
        let callback: WatchFn<T> = Rc::new(callback);
        self.inner
            .subscribers
            .borrow_mut()
            .insert(id, Subscriber::Watch(callback));
        id
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.unsubscribe(id);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    pub(crate) fn downgrade(&self) -> WeakSignal<T> {
        WeakSignal(Rc::downgrade(&self.inner))
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

/// Non-owning handle to a signal.
pub(crate) struct WeakSignal<T>(Weak<SignalInner<T>>);

impl<T> WeakSignal<T>
where
    T: Clone + PartialEq + 'static,
{
    pub(crate) fn upgrade(&self) -> Option<Signal<T>> {
        self.0.upgrade().map(|inner| Signal { inner })
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
