//! Reactive Runtime
//!
//! The runtime coordinates deferred notification and lifecycle hooks.
//!
//! # Batching
//!
//! 1. The outermost [`batch`] opens a pending set. Nested calls run inline
//!    and contribute to the same set.
//!
//! 2. While the set is open, signals queue their computation subscribers
//!    instead of running them. Queuing is keyed by subscriber ID, so a
//!    computation queued by several writes runs once.
//!
//! 3. When the outermost body returns, successfully or not, the set is
//!    detached and every queued computation runs in insertion order.
//!
//! Watch callbacks are never queued; they run inline during `set`.
//!
//! # Lifecycle
//!
//! [`on_mount`] defers a callback to the next animation frame of the
//! installed document. [`on_unmount`] registers a callback that runs when
//! the node being rendered is disposed.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::effect::{Cleanup, Computation, Effect};
use super::SubscriberId;
use crate::dom::Document;
use crate::error::Result;
use crate::render::{render_mode, RenderMode};

thread_local! {
    static PENDING: RefCell<Option<IndexMap<SubscriberId, Rc<Computation>>>> =
        const { RefCell::new(None) };
}

/// Closes the pending set if the batch body unwinds.
struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        PENDING.with(|pending| pending.borrow_mut().take());
    }
}

/// Check if a batch is currently open.
pub fn is_batching() -> bool {
    PENDING.with(|pending| pending.borrow().is_some())
}

pub(crate) fn enqueue(computation: Rc<Computation>) {
    PENDING.with(|pending| {
        if let Some(queue) = pending.borrow_mut().as_mut() {
            queue.entry(computation.id()).or_insert(computation);
        }
    });
}

/// Run `f` with notifications deferred until the outermost batch ends.
///
/// Notifications queued before a failure still run. An error raised while
/// flushing takes precedence over the body's own result.
///
/// ```rust,ignore
/// batch(|| {
///     first.set(1)?;
///     second.set(2)
/// })?;
/// ```
pub fn batch<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
    let outermost = PENDING.with(|pending| {
        let mut pending = pending.borrow_mut();
        if pending.is_some() {
            false
        } else {
            *pending = Some(IndexMap::new());
            true
        }
    });
    if !outermost {
        return f();
    }

    let guard = BatchGuard;
    let outcome = f();
    let queued = PENDING.with(|pending| pending.borrow_mut().take()).unwrap_or_default();
    drop(guard);

    debug!(queued = queued.len(), "flushing batch");
    for computation in queued.into_values() {
        computation.notify()?;
    }
    outcome
}

/// Schedule `callback` for the next animation frame.
///
/// Returns the frame handle, or `0` when not rendering against a document.
pub fn on_mount(callback: impl FnOnce() + 'static) -> u32 {
    if render_mode() != RenderMode::Client {
        return 0;
    }
    match Document::current() {
        Some(document) => document.request_animation_frame(callback),
        None => 0,
    }
}

/// Run `callback` when the node currently being rendered is disposed.
pub fn on_unmount(callback: impl Fn() + 'static) -> Result<Effect> {
    let callback = Rc::new(callback);
    Effect::new(move || {
        let callback = Rc::clone(&callback);
        Cleanup::new(move || callback())
    })
}
