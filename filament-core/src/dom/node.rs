//! DOM Nodes
//!
//! This module defines the node tree the client renderer writes into.
//!
//! A [`Node`] is a cheap handle (`Rc`) to shared node data. Parents own
//! their children; children point back with a weak link. Fragments are
//! transparent containers: inserting one moves its children instead.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use tracing::warn;

use super::document::{record, Mutation};
use super::event::{Event, Handler, Listener, ListenerId};
use super::DomError;
use crate::error::Result;
use crate::reactive::Disposer;
use crate::render::attr::{escape_html, is_void_element};
use crate::render::Value;

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// The kind of node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: Rc<str>,
        namespace: Option<&'static str>,
    },
    Text,
    Comment,
    Fragment,
    /// Pre-rendered markup, serialized verbatim.
    Raw,
}

/// Reconciliation status of a rendered list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Inserted,
    Deleted,
    Retained,
}

/// Tag carried by nodes produced by keyed list rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSlot {
    pub status: SlotStatus,
    pub index: usize,
}

struct NodeData {
    id: NodeId,
    kind: NodeKind,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Node>>,
    text: RefCell<String>,
    attributes: RefCell<IndexMap<String, String>>,
    properties: RefCell<IndexMap<String, Value>>,
    listeners: RefCell<Vec<Listener>>,
    cleanups: RefCell<Vec<Disposer>>,
    fragment_cleanups: RefCell<Vec<Disposer>>,
    list_slot: Cell<Option<ListSlot>>,
    range_start: Cell<bool>,
}

/// A handle to a node in the tree.
///
/// Clones refer to the same node; equality is identity.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

/// Non-owning handle to a node.
#[derive(Clone)]
pub struct WeakNode(Weak<NodeData>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl Node {
    fn with_kind(kind: NodeKind, text: String) -> Self {
        Self(Rc::new(NodeData {
            id: NodeId::new(),
            kind,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            text: RefCell::new(text),
            attributes: RefCell::new(IndexMap::new()),
            properties: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            fragment_cleanups: RefCell::new(Vec::new()),
            list_slot: Cell::new(None),
            range_start: Cell::new(false),
        }))
    }

    pub fn element(tag: &str) -> Self {
        Self::element_ns(tag, None)
    }

    pub fn element_ns(tag: &str, namespace: Option<&'static str>) -> Self {
        Self::with_kind(
            NodeKind::Element {
                tag: Rc::from(tag),
                namespace,
            },
            String::new(),
        )
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text, content.into())
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Comment, content.into())
    }

    pub fn fragment() -> Self {
        Self::with_kind(NodeKind::Fragment, String::new())
    }

    pub fn raw(html: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Raw, html.into())
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<&'static str> {
        match &self.0.kind {
            NodeKind::Element { namespace, .. } => *namespace,
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.kind, NodeKind::Element { .. })
    }

    pub fn is_fragment(&self) -> bool {
        self.0.kind == NodeKind::Fragment
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    // ------------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.0.children.borrow().last().cloned()
    }

    fn index_in_parent(&self) -> Option<(Node, usize)> {
        let parent = self.parent()?;
        let index = parent.position_of(self)?;
        Some((parent, index))
    }

    fn position_of(&self, child: &Node) -> Option<usize> {
        self.0.children.borrow().iter().position(|candidate| candidate == child)
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let (parent, index) = self.index_in_parent()?;
        let sibling = parent.0.children.borrow().get(index + 1).cloned();
        sibling
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let (parent, index) = self.index_in_parent()?;
        let sibling = index
            .checked_sub(1)
            .and_then(|previous| parent.0.children.borrow().get(previous).cloned());
        sibling
    }

    pub fn contains(&self, other: &Node) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if &node == self {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    // ------------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------------

    /// Detach from the current parent without recording a mutation.
    fn detach(&self) {
        if let Some((parent, index)) = self.index_in_parent() {
            parent.0.children.borrow_mut().remove(index);
        }
        *self.0.parent.borrow_mut() = Weak::new();
    }

    fn splice(&self, index: usize, child: &Node) -> std::result::Result<usize, DomError> {
        if child.contains(self) {
            return Err(DomError::HierarchyRequest);
        }
        if child.is_fragment() {
            let moved = child.children();
            for (offset, grandchild) in moved.iter().enumerate() {
                self.splice(index + offset, grandchild)?;
            }
            return Ok(moved.len());
        }

        // Removing an earlier sibling shifts the target index.
        let mut index = index;
        if let Some((parent, current)) = child.index_in_parent() {
            if parent == *self && current < index {
                index -= 1;
            }
        }
        child.detach();
        let mut children = self.0.children.borrow_mut();
        let index = index.min(children.len());
        children.insert(index, child.clone());
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        Ok(1)
    }

    pub fn append_child(&self, child: &Node) -> std::result::Result<(), DomError> {
        let index = self.child_count();
        self.splice(index, child)?;
        record(Mutation::Insert {
            parent: self.id(),
            node: child.id(),
        });
        Ok(())
    }

    pub fn prepend(&self, child: &Node) -> std::result::Result<(), DomError> {
        let first = self.first_child();
        self.insert_before(child, first.as_ref())
    }

    /// Insert `child` before `reference`, or at the end when it is `None`.
    pub fn insert_before(
        &self,
        child: &Node,
        reference: Option<&Node>,
    ) -> std::result::Result<(), DomError> {
        let index = match reference {
            Some(reference) => self.position_of(reference).ok_or(DomError::NotAChild)?,
            None => self.child_count(),
        };
        self.splice(index, child)?;
        record(Mutation::Insert {
            parent: self.id(),
            node: child.id(),
        });
        Ok(())
    }

    pub fn remove_child(&self, child: &Node) -> std::result::Result<(), DomError> {
        let index = self.position_of(child).ok_or(DomError::NotAChild)?;
        self.0.children.borrow_mut().remove(index);
        *child.0.parent.borrow_mut() = Weak::new();
        record(Mutation::Remove {
            parent: self.id(),
            node: child.id(),
        });
        Ok(())
    }

    /// Detach from the parent, if any.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            if let Err(err) = parent.remove_child(self) {
                warn!(%err, node = self.id().raw(), "node missing from its parent");
            }
        }
    }

    /// Put `replacement` where this node is. Does nothing when detached.
    pub fn replace_with(&self, replacement: &Node) -> std::result::Result<(), DomError> {
        let Some((parent, index)) = self.index_in_parent() else {
            return Ok(());
        };
        if replacement == self {
            return Ok(());
        }
        parent.splice(index, replacement)?;
        self.detach();
        record(Mutation::Replace {
            parent: parent.id(),
            old: self.id(),
            new: replacement.id(),
        });
        Ok(())
    }

    pub fn clear_children(&self) {
        for child in std::mem::take(&mut *self.0.children.borrow_mut()) {
            *child.0.parent.borrow_mut() = Weak::new();
        }
    }

    // ------------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------------

    /// Own text for text, comment and raw nodes; descendant text otherwise.
    pub fn text_content(&self) -> String {
        match self.0.kind {
            NodeKind::Text | NodeKind::Comment | NodeKind::Raw => self.0.text.borrow().clone(),
            NodeKind::Element { .. } | NodeKind::Fragment => {
                let mut out = String::new();
                self.collect_text(&mut out);
                out
            }
        }
    }

    fn collect_text(&self, out: &mut String) {
        for child in self.0.children.borrow().iter() {
            match child.0.kind {
                NodeKind::Text | NodeKind::Raw => out.push_str(&child.0.text.borrow()),
                NodeKind::Comment => {}
                _ => child.collect_text(out),
            }
        }
    }

    pub fn set_text_content(&self, content: &str) {
        match self.0.kind {
            NodeKind::Text | NodeKind::Comment | NodeKind::Raw => {
                *self.0.text.borrow_mut() = content.to_string();
            }
            _ => {
                self.clear_children();
                if !content.is_empty() {
                    let text = Node::text(content);
                    self.0.children.borrow_mut().push(text.clone());
                    *text.0.parent.borrow_mut() = Rc::downgrade(&self.0);
                }
            }
        }
    }

    /// Replace the children with pre-rendered markup.
    pub fn set_inner_html(&self, html: &str) {
        self.clear_children();
        let raw = Node::raw(html);
        self.0.children.borrow_mut().push(raw.clone());
        *raw.0.parent.borrow_mut() = Rc::downgrade(&self.0);
    }

    // ------------------------------------------------------------------------
    // Attributes and properties
    // ------------------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.attributes.borrow().contains_key(name)
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.0
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.into());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.0.attributes.borrow_mut().shift_remove(name);
    }

    pub fn attributes(&self) -> IndexMap<String, String> {
        self.0.attributes.borrow().clone()
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.0.properties.borrow().get(name).cloned()
    }

    pub fn set_property(&self, name: &str, value: Value) {
        self.0
            .properties
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    /// Live `<option>` descendants whose `selected` property is truthy.
    pub fn selected_options(&self) -> Vec<Node> {
        self.descendants()
            .into_iter()
            .filter(|node| node.tag_name() == Some("option"))
            .filter(|node| node.property("selected").is_some_and(|value| value.is_truthy()))
            .collect()
    }

    /// Every descendant in document order.
    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        for child in self.0.children.borrow().iter() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    pub fn add_event_listener(&self, event: &str, handler: Handler, capture: bool) -> ListenerId {
        let listener = Listener::new(event, handler, capture);
        let id = listener.id();
        self.0.listeners.borrow_mut().push(listener);
        id
    }

    pub fn remove_event_listener(&self, id: ListenerId) {
        self.0.listeners.borrow_mut().retain(|listener| listener.id() != id);
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.0
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.event() == event)
            .count()
    }

    pub(crate) fn listeners_for(&self, event: &str, capture: Option<bool>) -> Vec<Handler> {
        self.0
            .listeners
            .borrow()
            .iter()
            .filter(|listener| listener.event() == event)
            .filter(|listener| capture.map_or(true, |phase| listener.capture() == phase))
            .map(|listener| listener.handler())
            .collect()
    }

    /// Dispatch an event through capture, target and bubble phases.
    pub fn dispatch_event(&self, kind: &str) -> Result<()> {
        Event::new(kind, self.clone()).dispatch()
    }

    // ------------------------------------------------------------------------
    // Cleanup
    // ------------------------------------------------------------------------

    /// Attach a teardown action run when this node is disposed.
    pub fn on_dispose(&self, disposer: impl FnOnce() + 'static) {
        self.0.cleanups.borrow_mut().push(Box::new(disposer));
    }

    pub(crate) fn add_cleanups(&self, disposers: Vec<Disposer>) {
        self.0.cleanups.borrow_mut().extend(disposers);
    }

    pub(crate) fn add_fragment_cleanups(&self, disposers: Vec<Disposer>) {
        self.0.fragment_cleanups.borrow_mut().extend(disposers);
    }

    pub fn pending_cleanups(&self) -> usize {
        self.0.cleanups.borrow().len() + self.0.fragment_cleanups.borrow().len()
    }

    /// Run every teardown attached to this node and its descendants.
    ///
    /// Each disposer runs at most once; disposing again is a no-op.
    pub fn dispose(&self) {
        let own = std::mem::take(&mut *self.0.cleanups.borrow_mut());
        let fragment = std::mem::take(&mut *self.0.fragment_cleanups.borrow_mut());
        for disposer in own.into_iter().chain(fragment) {
            disposer();
        }
        for child in self.children() {
            child.dispose();
        }
    }

    // ------------------------------------------------------------------------
    // Reconciliation tags
    // ------------------------------------------------------------------------

    pub fn list_slot(&self) -> Option<ListSlot> {
        self.0.list_slot.get()
    }

    pub fn set_list_slot(&self, slot: Option<ListSlot>) {
        self.0.list_slot.set(slot);
    }

    pub(crate) fn mark_range_start(&self) {
        self.0.range_start.set(true);
    }

    pub(crate) fn is_range_start(&self) -> bool {
        self.0.range_start.get()
    }

    // ------------------------------------------------------------------------
    // Comparison and serialization
    // ------------------------------------------------------------------------

    /// Structural equality: kind, attributes, text and children.
    pub fn is_equal_node(&self, other: &Node) -> bool {
        if self == other {
            return true;
        }
        if self.0.kind != other.0.kind
            || *self.0.text.borrow() != *other.0.text.borrow()
            || *self.0.attributes.borrow() != *other.0.attributes.borrow()
        {
            return false;
        }
        let ours = self.0.children.borrow();
        let theirs = other.0.children.borrow();
        ours.len() == theirs.len() && ours.iter().zip(theirs.iter()).all(|(a, b)| a.is_equal_node(b))
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.0.children.borrow().iter() {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        match &self.0.kind {
            NodeKind::Text => out.push_str(&escape_html(&self.0.text.borrow())),
            NodeKind::Raw => out.push_str(&self.0.text.borrow()),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&self.0.text.borrow());
                out.push_str("-->");
            }
            NodeKind::Fragment => out.push_str(&self.inner_html()),
            NodeKind::Element { tag, .. } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in self.0.attributes.borrow().iter() {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_html(value));
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(tag) {
                    return;
                }
                out.push_str(&self.inner_html());
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("children", &self.child_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> (Node, Vec<Node>) {
        let parent = Node::element("ul");
        let children: Vec<Node> = items
            .iter()
            .map(|text| {
                let item = Node::element("li");
                item.append_child(&Node::text(*text)).unwrap();
                parent.append_child(&item).unwrap();
                item
            })
            .collect();
        (parent, children)
    }

    #[test]
    fn node_ids_are_unique() {
        assert_ne!(NodeId::new(), NodeId::new());
    }

    #[test]
    fn append_and_navigate() {
        let (parent, items) = list(&["a", "b", "c"]);

        assert_eq!(parent.child_count(), 3);
        assert_eq!(items[1].parent(), Some(parent.clone()));
        assert_eq!(items[0].next_sibling(), Some(items[1].clone()));
        assert_eq!(items[2].previous_sibling(), Some(items[1].clone()));
        assert_eq!(items[2].next_sibling(), None);
        assert_eq!(parent.text_content(), "abc");
    }

    #[test]
    fn fragments_move_their_children() {
        let parent = Node::element("div");
        let fragment = Node::fragment();
        fragment.append_child(&Node::text("x")).unwrap();
        fragment.append_child(&Node::text("y")).unwrap();

        parent.append_child(&fragment).unwrap();
        assert_eq!(parent.child_count(), 2);
        assert_eq!(fragment.child_count(), 0);
        assert_eq!(parent.inner_html(), "xy");
    }

    #[test]
    fn insert_before_and_move_within_parent() {
        let (parent, items) = list(&["a", "b", "c"]);

        parent.insert_before(&items[2], Some(&items[0])).unwrap();
        assert_eq!(parent.text_content(), "cab");

        parent.insert_before(&items[2], None).unwrap();
        assert_eq!(parent.text_content(), "abc");
    }

    #[test]
    fn insert_before_a_stranger_fails() {
        let (parent, _) = list(&["a"]);
        let stranger = Node::element("li");
        assert_eq!(
            parent.insert_before(&Node::text("z"), Some(&stranger)),
            Err(DomError::NotAChild)
        );
    }

    #[test]
    fn cannot_insert_an_ancestor() {
        let outer = Node::element("div");
        let inner = Node::element("span");
        outer.append_child(&inner).unwrap();
        assert_eq!(inner.append_child(&outer), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn replace_with_swaps_in_place() {
        let (parent, items) = list(&["a", "b", "c"]);
        let replacement = Node::text("B");

        items[1].replace_with(&replacement).unwrap();
        assert_eq!(parent.text_content(), "aBc");
        assert!(items[1].parent().is_none());

        // Detached nodes ignore replacement.
        items[1].replace_with(&Node::text("?")).unwrap();
        assert_eq!(parent.text_content(), "aBc");
    }

    #[test]
    fn serializes_elements_and_escapes_text() {
        let div = Node::element("div");
        div.set_attribute("class", "x");
        div.set_attribute("hidden", "");
        div.append_child(&Node::text("a < b")).unwrap();
        div.append_child(&Node::element("br")).unwrap();
        div.append_child(&Node::comment("marker")).unwrap();

        assert_eq!(
            div.outer_html(),
            "<div class=\"x\" hidden>a &lt; b<br><!--marker--></div>"
        );
    }

    #[test]
    fn equal_nodes_compare_structurally() {
        let (first, _) = list(&["a", "b"]);
        let (second, _) = list(&["a", "b"]);
        let (third, _) = list(&["a", "c"]);

        assert!(first.is_equal_node(&second));
        assert!(!first.is_equal_node(&third));
        assert_ne!(first, second);
    }

    #[test]
    fn dispose_runs_cleanups_once_and_recurses() {
        use std::cell::Cell;

        let (parent, items) = list(&["a", "b"]);
        let ran = Rc::new(Cell::new(0));

        for node in [&parent, &items[0], &items[1]] {
            let ran = ran.clone();
            node.on_dispose(move || ran.set(ran.get() + 1));
        }

        parent.dispose();
        assert_eq!(ran.get(), 3);
        parent.dispose();
        assert_eq!(ran.get(), 3);
    }

    #[test]
    fn inner_html_replaces_children() {
        let (parent, _) = list(&["a"]);
        parent.set_inner_html("<b>bold</b>");
        assert_eq!(parent.outer_html(), "<ul><b>bold</b></ul>");
    }
}
