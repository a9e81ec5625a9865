//! Aggregate State
//!
//! A [`State`] is a fixed set of named signals built from an initial record.
//! Reads and writes go through explicit `get`/`set` calls; the extra
//! operations (`signal`, `peek`, `snapshot`, `reset`) are plain methods, so
//! they can never collide with a user key.
//!
//! Keys are fixed at construction. Touching any other key fails with
//! [`Error::UndeclaredKey`].

use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use super::runtime::batch;
use super::Signal;
use crate::error::{Error, Result};

/// A keyed bundle of signals.
///
/// Clones share the same cells.
pub struct State<V>
where
    V: Clone + PartialEq + 'static,
{
    cells: Rc<IndexMap<String, Signal<V>>>,
    initial: Rc<IndexMap<String, V>>,
}

impl<V> State<V>
where
    V: Clone + PartialEq + 'static,
{
    /// Build one signal per entry, in declaration order.
    pub fn new<K, I>(initial: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let initial: IndexMap<String, V> = initial
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        let cells = initial
            .iter()
            .map(|(key, value)| (key.clone(), Signal::new(value.clone())))
            .collect();
        Self {
            cells: Rc::new(cells),
            initial: Rc::new(initial),
        }
    }

    /// The raw signal behind `key`.
    pub fn signal(&self, key: &str) -> Result<Signal<V>> {
        self.cells
            .get(key)
            .cloned()
            .ok_or_else(|| Error::UndeclaredKey(key.to_string()))
    }

    /// Tracked read.
    pub fn get(&self, key: &str) -> Result<V> {
        Ok(self.signal(key)?.get())
    }

    /// Untracked read.
    pub fn peek(&self, key: &str) -> Result<V> {
        Ok(self.signal(key)?.peek())
    }

    pub fn set(&self, key: &str, value: V) -> Result<()> {
        self.signal(key)?.set(value)
    }

    pub fn update(&self, key: &str, f: impl FnOnce(&V) -> V) -> Result<()> {
        self.signal(key)?.update(f)
    }

    /// Tracked snapshot of every current value.
    pub fn snapshot(&self) -> IndexMap<String, V> {
        self.cells
            .iter()
            .map(|(key, cell)| (key.clone(), cell.get()))
            .collect()
    }

    /// Snapshot serialized as a JSON object.
    pub fn to_json(&self) -> Result<serde_json::Value>
    where
        V: Serialize,
    {
        Ok(serde_json::to_value(self.snapshot())?)
    }

    /// Restore every key to its initial value inside one batch.
    pub fn reset(&self) -> Result<()> {
        batch(|| {
            for (key, cell) in self.cells.iter() {
                if let Some(value) = self.initial.get(key) {
                    cell.set(value.clone())?;
                }
            }
            Ok(())
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.cells.contains_key(key)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.cells) as *const () as usize
    }
}

impl<V> Clone for State<V>
where
    V: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cells: Rc::clone(&self.cells),
            initial: Rc::clone(&self.initial),
        }
    }
}

impl<V> PartialEq for State<V>
where
    V: Clone + PartialEq + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cells, &other.cells)
    }
}

impl<V> std::fmt::Debug for State<V>
where
    V: Clone + PartialEq + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.cells.iter().map(|(key, cell)| (key, cell.peek())))
            .finish()
    }
}

/// A single-field state holding `current`.
pub struct Ref<V>
where
    V: Clone + PartialEq + 'static,
{
    state: State<V>,
    current: Signal<V>,
}

impl<V> Ref<V>
where
    V: Clone + PartialEq + 'static,
{
    pub fn new(current: V) -> Self {
        let state = State::new([("current", current)]);
        let current = Signal::clone(&state.cells["current"]);
        Self { state, current }
    }

    /// Tracked read of `current`.
    pub fn current(&self) -> V {
        self.current.get()
    }

    pub fn set_current(&self, value: V) -> Result<()> {
        self.current.set(value)
    }

    /// The underlying one-key state.
    pub fn state(&self) -> &State<V> {
        &self.state
    }

    pub(crate) fn addr(&self) -> usize {
        self.state.addr()
    }
}

impl<V> Clone for Ref<V>
where
    V: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            current: self.current.clone(),
        }
    }
}

impl<V> PartialEq for Ref<V>
where
    V: Clone + PartialEq + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<V> std::fmt::Debug for Ref<V>
where
    V: Clone + PartialEq + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ref").field("current", &self.current.peek()).finish()
    }
}
