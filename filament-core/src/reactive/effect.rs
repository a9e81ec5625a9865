//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect re-runs (or is queued, if a
//!    batch is open).
//!
//! 3. Before re-running, the cleanup returned by the previous run is
//!    invoked.
//!
//! # Cycle Guard
//!
//! A computation that writes to a signal it depends on would be notified
//! while it is still the running computation. Notifications arriving in
//! that state are dropped, so the write settles instead of recursing.
//!
//! # Cleanup
//!
//! An effect body can return a [`Cleanup`]. It is called before the next run
//! and when the effect is disposed. When a cleanup is produced while the
//! renderer is collecting cleanups, the effect's disposal is attached to the
//! node being rendered, so unmounting that node tears the effect down.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::context::{self, recompute, ReactiveContext};
use super::subscriber::{Source, SubscriberId};
use crate::error::Result;

/// A teardown callback returned from an effect body.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(f))
    }

    fn run(self) {
        (self.0)()
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cleanup")
    }
}

/// Values an effect body may return.
pub trait EffectResult {
    fn into_cleanup(self) -> Result<Option<Cleanup>>;
}

impl EffectResult for () {
    fn into_cleanup(self) -> Result<Option<Cleanup>> {
        Ok(None)
    }
}

impl EffectResult for Cleanup {
    fn into_cleanup(self) -> Result<Option<Cleanup>> {
        Ok(Some(self))
    }
}

impl EffectResult for Option<Cleanup> {
    fn into_cleanup(self) -> Result<Option<Cleanup>> {
        Ok(self)
    }
}

impl<T: EffectResult> EffectResult for Result<T> {
    fn into_cleanup(self) -> Result<Option<Cleanup>> {
        self?.into_cleanup()
    }
}

type RunFn = Box<dyn Fn(&Rc<Computation>) -> Result<()>>;

/// The unit of re-execution shared by effects and derived values.
pub(crate) struct Computation {
    id: SubscriberId,
    run: RunFn,
    cleanup: RefCell<Option<Cleanup>>,
    sources: RefCell<SmallVec<[Weak<dyn Source>; 4]>>,
    disposed: Cell<bool>,
    run_count: Cell<usize>,
}

impl Computation {
    pub(crate) fn new<F>(run: F) -> Rc<Self>
    where
        F: Fn(&Rc<Computation>) -> Result<()> + 'static,
    {
        Rc::new(Self {
            id: SubscriberId::new(),
            run: Box::new(run),
            cleanup: RefCell::new(None),
            sources: RefCell::new(SmallVec::new()),
            disposed: Cell::new(false),
            run_count: Cell::new(0),
        })
    }

    /// The ID doubles as the generation tag checked by the cycle guard.
    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn notify(self: &Rc<Self>) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }
        (self.run)(self)
    }

    /// True when this computation is the one currently running.
    pub(crate) fn is_cycle(&self) -> bool {
        ReactiveContext::current_subscriber() == Some(self.id)
    }

    pub(crate) fn record_run(&self) {
        self.run_count.set(self.run_count.get() + 1);
    }

    pub(crate) fn run_count(&self) -> usize {
        self.run_count.get()
    }

    pub(crate) fn add_source(&self, source: Weak<dyn Source>) {
        self.sources.borrow_mut().push(source);
    }

    pub(crate) fn dependency_count(&self) -> usize {
        self.sources
            .borrow()
            .iter()
            .filter(|source| source.strong_count() > 0)
            .count()
    }

    fn set_cleanup(&self, cleanup: Cleanup) {
        *self.cleanup.borrow_mut() = Some(cleanup);
    }

    /// Run the pending cleanup, if any.
    pub(crate) fn clean(&self) -> bool {
        let pending = self.cleanup.borrow_mut().take();
        match pending {
            Some(cleanup) => {
                context::forget_disposer(self.id);
                cleanup.run();
                true
            }
            None => false,
        }
    }

    /// Run the pending cleanup and deregister from every source.
    pub(crate) fn dispose(&self) {
        self.disposed.set(true);
        self.clean();
        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in sources.iter().filter_map(Weak::upgrade) {
            source.unsubscribe(self.id);
        }
        trace!(computation = self.id.raw(), sources = sources.len(), "computation disposed");
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// let reader = count.clone();
///
/// let effect = Effect::new(move || {
///     println!("Count is: {}", reader.get());
/// })?;
///
/// count.set(5)?; // Prints: "Count is: 5"
/// effect.dispose();
/// ```
pub struct Effect {
    computation: Rc<Computation>,
}

impl Effect {
    /// Create a new effect and run it once.
    ///
    /// If the first run fails, the effect is disposed and the error is
    /// returned.
    pub fn new<F, R>(f: F) -> Result<Self>
    where
        F: Fn() -> R + 'static,
        R: EffectResult,
    {
        let computation = Computation::new(move |this| {
            if this.is_cycle() {
                debug!(effect = this.id().raw(), "effect re-entered itself; skipping");
                return Ok(());
            }
            this.clean();
            this.record_run();
            trace!(effect = this.id().raw(), "running effect");

            let cleanup = recompute(Some(Rc::clone(this)), &f).into_cleanup()?;
            if let Some(cleanup) = cleanup {
                this.set_cleanup(cleanup);
                let owner = Rc::clone(this);
                context::register_disposer(this.id(), move || owner.dispose());
            }
            Ok(())
        });

        if let Err(err) = computation.notify() {
            computation.dispose();
            return Err(err);
        }
        Ok(Self { computation })
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.computation.id()
    }

    /// Run the cleanup and stop reacting to dependencies.
    pub fn dispose(&self) {
        self.computation.dispose();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.computation.is_disposed()
    }

    /// Get the number of times the effect body has run.
    pub fn run_count(&self) -> usize {
        self.computation.run_count()
    }

    /// Get the number of live signals this effect is subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.computation.dependency_count()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            computation: Rc::clone(&self.computation),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
