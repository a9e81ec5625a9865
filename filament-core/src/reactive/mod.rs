//! Reactive Primitives
//!
//! This module implements the reactive core: signals, derived values,
//! effects, batching and aggregate state.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (a derived value or an effect), the signal
//! registers that computation as a subscriber. When the value changes, every
//! subscriber is notified.
//!
//! ## Derived Values
//!
//! A Computed is a lazily initialized, memoized value. It re-evaluates when
//! one of its dependencies changes and only notifies its own observers when
//! the result is structurally different.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs eagerly and then
//! again whenever its dependencies change. It may return a cleanup.
//!
//! ## Batches and State
//!
//! A batch defers computation re-runs until a group of writes completes.
//! A State bundles named signals with snapshot and reset operations.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to detect
//! dependencies automatically. Handles are `Rc`-based and `!Send`; a graph
//! lives on the thread that created it.

mod computed;
mod context;
mod effect;
mod runtime;
mod signal;
mod state;
mod subscriber;

pub use computed::{Computed, ErrorHandler, Memoize};
pub use context::{untrack, Disposer, ReactiveContext};
pub use effect::{Cleanup, Effect, EffectResult};
pub use runtime::{batch, is_batching, on_mount, on_unmount};
pub use signal::Signal;
pub use state::{Ref, State};
pub use subscriber::{SubscriberId, WatchFn};

pub(crate) use context::{collect_cleanups, register_disposer};
pub(crate) use signal::WeakSignal;
