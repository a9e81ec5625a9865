//! Derived Values
//!
//! A [`Computed`] is a memoized, read-only value recomputed from other
//! reactive sources.
//!
//! # How Derived Values Work
//!
//! 1. Nothing runs at construction. The first read creates the underlying
//!    computation and evaluates it once.
//!
//! 2. Each evaluation calls the expression. List results skip memoization.
//!    A result that is itself a zero-argument callable is invoked once more.
//!
//! 3. The result is compared with the previous raw result using structural
//!    equality. Only when they differ is the result materialized again
//!    (declarative elements are rendered at this point).
//!
//! 4. The materialized result is written into a backing signal, whose own
//!    equality check suppresses notifications for unchanged values.
//!
//! Errors go to the error handler when one was supplied; its return value
//! becomes the new value. Without a handler they propagate to whoever
//! triggered the evaluation.
//!
//! The per-type rules (structural equality, list bypass, thunk unwrapping,
//! materialization) live in the [`Memoize`] trait.

use std::cell::{OnceCell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::context::recompute;
use super::effect::Computation;
use super::{Signal, SubscriberId};
use crate::error::{Error, Result};

/// Maps a failure to a fallback value.
pub type ErrorHandler<T> = Rc<dyn Fn(Error) -> Result<T>>;

/// Value rules applied by derived values on every evaluation.
pub trait Memoize: Clone + PartialEq + 'static {
    /// Deep equality used to skip re-materialization.
    fn structural_eq(&self, other: &Self) -> bool {
        self == other
    }

    /// Lists bypass memoization entirely.
    fn is_list(&self) -> bool {
        false
    }

    /// Unwrap one level of zero-argument callable.
    fn resolve(self) -> Result<Self> {
        Ok(self)
    }

    /// Turn a changed value into what the backing signal stores.
    fn materialize(self, _on_error: Option<&ErrorHandler<Self>>) -> Result<Self> {
        Ok(self)
    }
}

macro_rules! memoize_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(impl Memoize for $ty {})*
    };
}

memoize_by_eq!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str, Rc<str>,
);

impl<T: Memoize> Memoize for Option<T> {
    fn structural_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.structural_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Memoize> Memoize for Vec<T> {
    fn structural_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.structural_eq(b))
    }

    fn is_list(&self) -> bool {
        true
    }
}

struct ComputedInner<T: Memoize> {
    compute: Box<dyn Fn() -> Result<T>>,
    on_error: Option<ErrorHandler<T>>,
    signal: Signal<Option<T>>,
    computation: OnceCell<Weak<Computation>>,
    previous: RefCell<Option<T>>,
    result: RefCell<Option<T>>,
}

impl<T: Memoize> ComputedInner<T> {
    fn evaluate(&self) -> Result<T> {
        let current = (self.compute)()?;
        if current.is_list() {
            return Ok(current);
        }
        let current = current.resolve()?;

        let unchanged = self
            .previous
            .borrow()
            .as_ref()
            .is_some_and(|previous| current.structural_eq(previous));
        if !unchanged {
            let materialized = current.clone().materialize(self.on_error.as_ref())?;
            *self.result.borrow_mut() = Some(materialized);
        }
        *self.previous.borrow_mut() = Some(current);

        self.result
            .borrow()
            .clone()
            .ok_or_else(|| Error::computation("derived value has no result"))
    }
}

/// A memoized derived value.
///
/// Clones share the same value. Equality between derived values is
/// identity.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(2);
/// let reader = count.clone();
/// let doubled = Computed::new(move || reader.get() * 2);
///
/// assert_eq!(doubled.get()?, 4);
/// ```
pub struct Computed<T: Memoize> {
    inner: Rc<ComputedInner<T>>,
}

impl<T: Memoize> Computed<T> {
    /// Create a derived value from an infallible expression.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self::build(Box::new(move || Ok(compute())), None)
    }

    /// Create a derived value from a fallible expression.
    pub fn try_new<F>(compute: F) -> Self
    where
        F: Fn() -> Result<T> + 'static,
    {
        Self::build(Box::new(compute), None)
    }

    /// Create a derived value whose failures are mapped to a fallback.
    pub fn with_error_handler<F>(compute: F, on_error: ErrorHandler<T>) -> Self
    where
        F: Fn() -> Result<T> + 'static,
    {
        Self::build(Box::new(compute), Some(on_error))
    }

    pub(crate) fn build(
        compute: Box<dyn Fn() -> Result<T>>,
        on_error: Option<ErrorHandler<T>>,
    ) -> Self {
        Self {
            inner: Rc::new(ComputedInner {
                compute,
                on_error,
                signal: Signal::new(None),
                computation: OnceCell::new(),
                previous: RefCell::new(None),
                result: RefCell::new(None),
            }),
        }
    }

    fn initialize(&self) -> Result<()> {
        if self.inner.computation.get().is_some() {
            return Ok(());
        }

        let inner = Rc::clone(&self.inner);
        let computation = Computation::new(move |this| {
            if this.is_cycle() {
                debug!(computation = this.id().raw(), "derived value re-entered itself; disposing");
                this.dispose();
                return Ok(());
            }
            this.record_run();

            let outcome = recompute(Some(Rc::clone(this)), || inner.evaluate())
                .and_then(|value| inner.signal.set(Some(value)));
            match (outcome, &inner.on_error) {
                (Ok(()), _) => Ok(()),
                (Err(err), Some(on_error)) => {
                    let fallback = on_error(err)?;
                    inner.signal.set(Some(fallback))
                }
                (Err(err), None) => Err(err),
            }
        });

        // Set before the first run so re-entrant reads do not initialize twice.
        let _ = self.inner.computation.set(Rc::downgrade(&computation));
        computation.notify()
    }

    /// Read the value, evaluating it on first access.
    pub fn get(&self) -> Result<T> {
        self.initialize()?;
        self.inner
            .signal
            .get()
            .ok_or_else(|| Error::computation("derived value has not produced a result"))
    }

    /// Read the last value without tracking or evaluating.
    pub fn peek(&self) -> Option<T> {
        self.inner.signal.peek()
    }

    /// Watch materialized changes as `(new, previous)`.
    pub fn watch<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&T, &T) -> Result<()> + 'static,
    {
        self.inner.signal.watch(move |new, previous| match (new, previous) {
            (Some(new), Some(previous)) => callback(new, previous),
            _ => Ok(()),
        })
    }

    /// Remove a watcher registered with [`Computed::watch`].
    pub fn unwatch(&self, id: SubscriberId) {
        self.inner.signal.unsubscribe(id);
    }

    /// Stop recomputing. The last value stays readable.
    pub fn dispose(&self) {
        if let Some(computation) = self.inner.computation.get().and_then(Weak::upgrade) {
            computation.dispose();
        }
    }

    /// Check whether the first evaluation has happened.
    pub fn is_initialized(&self) -> bool {
        self.inner.computation.get().is_some()
    }

    /// Number of times the expression has been evaluated.
    pub fn run_count(&self) -> usize {
        self.inner
            .computation
            .get()
            .and_then(Weak::upgrade)
            .map_or(0, |computation| computation.run_count())
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

impl<T: Memoize> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Memoize> PartialEq for Computed<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Memoize + Debug> Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("initialized", &self.is_initialized())
            .field("value", &self.peek())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use std::cell::Cell;

    #[test]
    fn computes_on_first_access() {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();

        let computed = Computed::new(move || {
            calls_clone.set(calls_clone.get() + 1);
            42
        });

        assert!(!computed.is_initialized());
        assert_eq!(calls.get(), 0);

        assert_eq!(computed.get().unwrap(), 42);
        assert_eq!(computed.get().unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn recomputes_when_dependency_changes() {
        let count = Signal::new(10);
        let reader = count.clone();
        let doubled = Computed::new(move || reader.get() * 2);

        assert_eq!(doubled.get().unwrap(), 20);
        count.set(5).unwrap();
        assert_eq!(doubled.peek(), Some(10));
    }

    #[test]
    fn unchanged_result_does_not_notify_watchers() {
        let count = Signal::new(1);
        let reader = count.clone();
        let parity = Computed::new(move || reader.get() % 2);
        let notified = Rc::new(Cell::new(0));

        parity.get().unwrap();
        let notified_clone = notified.clone();
        parity.watch(move |_, _| {
            notified_clone.set(notified_clone.get() + 1);
            Ok(())
        });

        count.set(3).unwrap();
        assert_eq!(notified.get(), 0);
        count.set(4).unwrap();
        assert_eq!(notified.get(), 1);
    }

    #[test]
    fn lists_bypass_memoization() {
        let count = Signal::new(0);
        let reader = count.clone();
        let list = Computed::new(move || {
            reader.get();
            vec![1, 2, 3]
        });
        let evaluations = Rc::new(Cell::new(0));

        list.get().unwrap();
        let evaluations_clone = evaluations.clone();
        list.watch(move |_, _| {
            evaluations_clone.set(evaluations_clone.get() + 1);
            Ok(())
        });

        // Equal lists still pass the equality check of the backing signal,
        // so nothing is re-notified, but each run re-evaluates.
        count.set(1).unwrap();
        assert_eq!(list.run_count(), 2);
        assert_eq!(evaluations.get(), 0);
    }

    #[test]
    fn error_handler_supplies_fallback() {
        let count = Signal::new(1);
        let reader = count.clone();
        let checked = Computed::with_error_handler(
            move || {
                let value = reader.get();
                if value < 0 {
                    Err(Error::computation("negative"))
                } else {
                    Ok(value)
                }
            },
            Rc::new(|_: Error| -> Result<i32> { Ok(-1) }),
        );

        assert_eq!(checked.get().unwrap(), 1);
        count.set(-5).unwrap();
        assert_eq!(checked.peek(), Some(-1));
    }

    #[test]
    fn errors_without_handler_propagate() {
        let computed: Computed<i32> = Computed::try_new(|| Err(Error::computation("nope")));
        assert!(matches!(computed.get(), Err(Error::Computation(_))));
    }

    #[test]
    fn effect_observes_derived_value() {
        let count = Signal::new(1);
        let reader = count.clone();
        let doubled = Computed::new(move || reader.get() * 2);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (derived, seen_clone) = (doubled.clone(), seen.clone());
        let _effect = Effect::new(move || -> Result<()> {
            seen_clone.borrow_mut().push(derived.get()?);
            Ok(())
        })
        .unwrap();

        count.set(4).unwrap();
        assert_eq!(*seen.borrow(), vec![2, 8]);
    }

    #[test]
    fn self_feeding_derived_value_disposes_itself() {
        let count = Signal::new(0);
        let writer = count.clone();
        let runaway: Computed<i32> = Computed::try_new(move || {
            let next = writer.get() + 1;
            writer.set(next)?;
            Ok(next)
        });

        assert_eq!(runaway.get().unwrap(), 1);
        assert_eq!(count.subscriber_count(), 0);

        count.set(10).unwrap();
        assert_eq!(runaway.peek(), Some(1));
    }

    #[test]
    fn structural_equality_of_options_and_vectors() {
        assert!(Some(vec![1, 2]).structural_eq(&Some(vec![1, 2])));
        assert!(!Some(vec![1, 2]).structural_eq(&Some(vec![2, 1])));
        assert!(None::<i32>.structural_eq(&None));
    }
}
