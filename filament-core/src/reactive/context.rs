//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! it registers the current computation as a subscriber.
//!
//! # Implementation
//!
//! A thread-local slot holds the running computation (or nothing).
//! Entering a context swaps the slot and returns a guard; dropping the guard
//! restores whatever was there before, even if the computation panics.
//! Nested contexts therefore unwind in the right order.
//!
//! The same module owns the cleanup-collection scope used by the renderer:
//! while a scope is open, effects that produce a cleanup (and reactive
//! bindings created by the renderer) register a disposer into it, and the
//! renderer attaches the collected disposers to the node it produced.
//!
//! None of this is thread-safe. Every reactive handle is `!Send`, so the
//! compiler keeps a graph on the thread that built it.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::effect::Computation;
use super::SubscriberId;

/// A deferred teardown action.
pub type Disposer = Box<dyn FnOnce()>;

thread_local! {
    static CURRENT: RefCell<Option<Rc<Computation>>> = const { RefCell::new(None) };
    static CLEANUP_SCOPE: RefCell<Option<IndexMap<SubscriberId, Disposer>>> =
        const { RefCell::new(None) };
}

/// Guard that restores the previous computation when dropped.
pub struct ReactiveContext {
    previous: Option<Rc<Computation>>,
    entered: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Install `target` (or nothing, for untracked execution) as the
    /// running computation until the guard is dropped.
    pub(crate) fn enter(target: Option<Rc<Computation>>) -> Self {
        let entered = target.as_ref().map(|computation| computation.id());
        let previous = CURRENT.with(|slot| slot.replace(target));
        Self { previous, entered }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        CURRENT.with(|slot| slot.borrow().is_some())
    }

    /// Get the ID of the running computation, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CURRENT.with(|slot| slot.borrow().as_ref().map(|computation| computation.id()))
    }

    pub(crate) fn current() -> Option<Rc<Computation>> {
        CURRENT.with(|slot| slot.borrow().clone())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|slot| {
            let popped = slot.replace(previous);

            // Catch contexts restored out of order.
            debug_assert_eq!(
                popped.as_ref().map(|computation| computation.id()),
                self.entered,
                "ReactiveContext mismatch: expected {:?}",
                self.entered
            );
        });
    }
}

/// Run `f` with `target` as the tracked computation.
pub(crate) fn recompute<R>(target: Option<Rc<Computation>>, f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::enter(target);
    f()
}

/// Run `f` without tracking any reads.
///
/// ```rust,ignore
/// let doubled = untrack(|| count.get() * 2); // no subscription
/// ```
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    recompute(None, f)
}

/// Guard for an open cleanup-collection scope.
struct CleanupScope {
    previous: Option<Option<IndexMap<SubscriberId, Disposer>>>,
}

impl CleanupScope {
    fn open() -> Self {
        let previous = CLEANUP_SCOPE.with(|scope| scope.replace(Some(IndexMap::new())));
        Self {
            previous: Some(previous),
        }
    }

    fn close(mut self) -> Vec<Disposer> {
        let previous = self.previous.take().flatten();
        CLEANUP_SCOPE
            .with(|scope| scope.replace(previous))
            .map(|collected| collected.into_values().collect())
            .unwrap_or_default()
    }
}

impl Drop for CleanupScope {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CLEANUP_SCOPE.with(|scope| {
                scope.replace(previous);
            });
        }
    }
}

/// Run `f` inside a fresh cleanup-collection scope and return the
/// disposers registered while it ran.
pub(crate) fn collect_cleanups<R>(f: impl FnOnce() -> R) -> (R, Vec<Disposer>) {
    let scope = CleanupScope::open();
    let result = f();
    (result, scope.close())
}

/// Register a disposer into the open scope, if any.
///
/// Registering the same ID twice keeps a single entry.
pub(crate) fn register_disposer(id: SubscriberId, disposer: impl FnOnce() + 'static) -> bool {
    CLEANUP_SCOPE.with(|scope| match scope.borrow_mut().as_mut() {
        Some(collected) => {
            collected.insert(id, Box::new(disposer));
            true
        }
        None => false,
    })
}

/// Drop a previously registered disposer without running it.
pub(crate) fn forget_disposer(id: SubscriberId) {
    CLEANUP_SCOPE.with(|scope| {
        if let Some(collected) = scope.borrow_mut().as_mut() {
            collected.shift_remove(&id);
        }
    });
}
