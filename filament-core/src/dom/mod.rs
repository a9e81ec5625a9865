//! Headless DOM
//!
//! An in-memory node tree with just enough of the browser surface for the
//! client renderer: element creation, tree edits, attributes and properties,
//! event listeners with capture and bubbling, animation frames and a
//! mutation log for inspecting what a render actually touched.

mod document;
mod event;
mod node;

use thiserror::Error;

pub use document::{observe_mutations, stop_observing, take_mutations, Document, Mutation};
pub use event::{Event, Handler, ListenerId};
pub use node::{ListSlot, Node, NodeId, NodeKind, SlotStatus, WeakNode};

/// Structural DOM failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("the reference node is not a child of this node")]
    NotAChild,

    #[error("a node cannot be inserted into its own subtree")]
    HierarchyRequest,

    #[error("the node is not attached to a parent")]
    Detached,
}
