//! Keyed List Reconciliation
//!
//! Patches a rendered list in place when both the old and the new value are
//! lists of nodes produced by [`for_each`](super::for_each).
//!
//! 1. Old nodes tagged [`SlotStatus::Deleted`] are removed from the parent.
//!    The surviving old nodes become the slot list.
//!
//! 2. New nodes are walked in order. A node already sitting in slot `i` is
//!    left alone; anything else is inserted before the node occupying slot
//!    `i`, or before the node that followed the old list when no slot `i`
//!    remains.
//!
//! Retained nodes never leave the document unless they move, so removing
//! one item from the middle costs exactly one removal.

use tracing::debug;

use crate::dom::{Node, SlotStatus};
use crate::error::Result;
use crate::render::Value;

fn tagged_nodes(value: &Value) -> Option<Vec<Node>> {
    let items = value.as_list()?;
    let first = items.first()?.as_node()?;
    first.list_slot()?;
    Some(items.iter().filter_map(Value::as_node).cloned().collect())
}

/// Apply a list change in place.
///
/// Returns `false` when the values are not reconcilable; the caller then
/// replaces the whole range.
pub(crate) fn reconcile_lists(next: &Value, previous: &Value) -> Result<bool> {
    let (Some(next), Some(previous)) = (tagged_nodes(next), tagged_nodes(previous)) else {
        return Ok(false);
    };
    let Some(parent) = previous.first().and_then(Node::parent) else {
        return Ok(false);
    };
    let end = previous.last().and_then(Node::next_sibling);

    let mut removed = 0;
    let mut slots = Vec::with_capacity(previous.len());
    for node in previous {
        let deleted = node
            .list_slot()
            .is_some_and(|slot| slot.status == SlotStatus::Deleted);
        if !deleted {
            slots.push(node);
            continue;
        }
        if node.parent().as_ref() == Some(&parent) {
            parent.remove_child(&node)?;
            removed += 1;
        }
    }
    if slots.is_empty() {
        return Ok(false);
    }

    let mut inserted = 0;
    for (index, node) in next.iter().enumerate() {
        if slots.get(index) == Some(node) {
            continue;
        }
        if let Some(position) = slots.iter().position(|slot| slot == node) {
            slots.remove(position);
        }
        let reference = slots.get(index).or(end.as_ref());
        parent.insert_before(node, reference)?;
        slots.insert(index.min(slots.len()), node.clone());
        inserted += 1;
    }

    debug!(removed, inserted, items = next.len(), "reconciled keyed list");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{observe_mutations, take_mutations, ListSlot, Mutation};

    fn item(text: &str, status: SlotStatus, index: usize) -> Node {
        let node = Node::element("li");
        node.set_text_content(text);
        node.set_list_slot(Some(ListSlot { status, index }));
        node
    }

    fn mount(nodes: &[Node]) -> (Node, Node) {
        let parent = Node::element("ul");
        for node in nodes {
            parent.append_child(node).unwrap();
        }
        let end = Node::comment("");
        parent.append_child(&end).unwrap();
        (parent, end)
    }

    fn list(nodes: &[Node]) -> Value {
        Value::list(nodes.iter().cloned().map(Value::Node))
    }

    #[test]
    fn removes_deleted_items_only() {
        let (a, b, c) = (
            item("a", SlotStatus::Retained, 0),
            item("b", SlotStatus::Retained, 1),
            item("c", SlotStatus::Retained, 2),
        );
        let (parent, _end) = mount(&[a.clone(), b.clone(), c.clone()]);
        b.set_list_slot(Some(ListSlot { status: SlotStatus::Deleted, index: 1 }));

        observe_mutations();
        let previous = list(&[a.clone(), b.clone(), c.clone()]);
        assert!(reconcile_lists(&list(&[a, c]), &previous).unwrap());

        let mutations = take_mutations();
        assert_eq!(mutations.len(), 1);
        assert!(matches!(mutations[0], Mutation::Remove { node, .. } if node == b.id()));
        assert_eq!(parent.text_content(), "ac");
    }

    #[test]
    fn inserts_before_the_occupied_slot() {
        let (a, c) = (item("a", SlotStatus::Retained, 0), item("c", SlotStatus::Retained, 1));
        let (parent, _end) = mount(&[a.clone(), c.clone()]);
        let b = item("b", SlotStatus::Inserted, 1);

        let previous = list(&[a.clone(), c.clone()]);
        assert!(reconcile_lists(&list(&[a, b, c]), &previous).unwrap());
        assert_eq!(parent.text_content(), "abc");
    }

    #[test]
    fn appends_before_the_end_marker() {
        let a = item("a", SlotStatus::Retained, 0);
        let (parent, end) = mount(&[a.clone()]);
        let b = item("b", SlotStatus::Inserted, 1);
        let c = item("c", SlotStatus::Inserted, 2);

        assert!(reconcile_lists(&list(&[a.clone(), b, c]), &list(&[a])).unwrap());
        assert_eq!(parent.text_content(), "abc");
        assert_eq!(parent.last_child(), Some(end));
    }

    #[test]
    fn moves_retained_items() {
        let (a, b, c) = (
            item("a", SlotStatus::Retained, 0),
            item("b", SlotStatus::Retained, 1),
            item("c", SlotStatus::Retained, 2),
        );
        let (parent, _end) = mount(&[a.clone(), b.clone(), c.clone()]);

        let previous = list(&[a.clone(), b.clone(), c.clone()]);
        assert!(reconcile_lists(&list(&[c, a, b]), &previous).unwrap());
        assert_eq!(parent.text_content(), "cab");
    }

    #[test]
    fn untagged_or_detached_lists_are_declined() {
        let plain = Value::list([Value::Node(Node::text("x"))]);
        assert!(!reconcile_lists(&plain, &plain).unwrap());
        assert!(!reconcile_lists(&Value::list([]), &plain).unwrap());

        let detached = item("a", SlotStatus::Retained, 0);
        let tagged = list(&[detached]);
        assert!(!reconcile_lists(&tagged, &tagged).unwrap());
    }

    #[test]
    fn everything_deleted_falls_back() {
        let a = item("a", SlotStatus::Deleted, 0);
        let (_parent, _end) = mount(&[a.clone()]);
        let b = item("b", SlotStatus::Inserted, 0);
        assert!(!reconcile_lists(&list(&[b]), &list(&[a])).unwrap());
    }
}
