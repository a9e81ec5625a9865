//! Event dispatch for the headless document.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Node;
use crate::error::Result;

/// An event listener callback.
pub type Handler = Rc<dyn Fn(&Event) -> Result<()>>;

/// Identifies a registered listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) struct Listener {
    id: ListenerId,
    event: String,
    capture: bool,
    handler: Handler,
}

impl Listener {
    pub(crate) fn new(event: &str, handler: Handler, capture: bool) -> Self {
        Self {
            id: ListenerId::new(),
            event: event.to_string(),
            capture,
            handler,
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn event(&self) -> &str {
        &self.event
    }

    pub(crate) fn capture(&self) -> bool {
        self.capture
    }

    pub(crate) fn handler(&self) -> Handler {
        Rc::clone(&self.handler)
    }
}

/// A dispatched event.
pub struct Event {
    kind: String,
    target: Node,
    current_target: RefCell<Option<Node>>,
    stopped: Cell<bool>,
}

impl Event {
    pub fn new(kind: &str, target: Node) -> Self {
        Self {
            kind: kind.to_string(),
            target,
            current_target: RefCell::new(None),
            stopped: Cell::new(false),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The node the event was dispatched on.
    pub fn target(&self) -> &Node {
        &self.target
    }

    /// The node whose listener is running.
    pub fn current_target(&self) -> Option<Node> {
        self.current_target.borrow().clone()
    }

    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    fn invoke(&self, node: &Node, capture: Option<bool>) -> Result<()> {
        let handlers = node.listeners_for(&self.kind, capture);
        if handlers.is_empty() {
            return Ok(());
        }
        *self.current_target.borrow_mut() = Some(node.clone());
        for handler in handlers {
            handler(self)?;
        }
        Ok(())
    }

    /// Capture from the root down, then the target, then bubble back up.
    pub(crate) fn dispatch(&self) -> Result<()> {
        let mut ancestors = Vec::new();
        let mut cursor = self.target.parent();
        while let Some(node) = cursor {
            cursor = node.parent();
            ancestors.push(node);
        }

        for node in ancestors.iter().rev() {
            if self.is_stopped() {
                return Ok(());
            }
            self.invoke(node, Some(true))?;
        }
        if self.is_stopped() {
            return Ok(());
        }
        self.invoke(&self.target, None)?;
        for node in ancestors.iter() {
            if self.is_stopped() {
                return Ok(());
            }
            self.invoke(node, Some(false))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("target", &self.target.id())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
