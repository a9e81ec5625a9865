//! Keyed list rendering.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::config::RenderOptions;
use crate::dom::{ListSlot, Node, SlotStatus};
use crate::error::{Error, Result};
use crate::reactive::{untrack, Signal};
use crate::render::{
    current_error_handler, h, jsx_render, Callback, ListKey, Props, PropsProxy, Value,
};

/// A rendered item kept across evaluations.
struct Entry {
    node: Node,
    index: Signal<Value>,
}

type Retained = Rc<RefCell<IndexMap<ListKey, Entry>>>;

/// Render `each` through the item callback passed as the first child.
///
/// The callback receives `[item, index, each]`, where `index` is a cell
/// that tracks the item's position. Items are keyed by the `key` prop of
/// the element the callback returns, or by the item itself. Known keys keep
/// their node; new keys are rendered once; keys that disappear have their
/// node disposed. `fallback` is shown while `each` is empty.
///
/// ```rust,ignore
/// h(
///     ElementType::component(for_each),
///     props! { "each" => &todos },
///     vec![Value::callback(|args| {
///         Ok(h("li", props! { "key" => args[0].clone() }, vec![args[0].clone()]))
///     })],
/// )
/// ```
pub fn for_each(props: PropsProxy) -> Result<Value> {
    let callback = item_callback(&props).ok_or(Error::MissingCallback)?;
    let on_error = current_error_handler();
    let retained: Retained = Rc::default();

    Ok(Value::thunk(move || {
        let each = props.get("each")?;
        let items = each.as_list().map(<[Value]>::to_vec).unwrap_or_default();

        if items.is_empty() {
            if let Some(fallback) = props.raw("fallback").filter(Value::is_truthy) {
                evict(&retained, |_| true);
                return Ok(fallback);
            }
        }

        let options = RenderOptions::default().with_error_handler(on_error.clone());
        let mut keys = HashSet::with_capacity(items.len());
        let mut rendered = Vec::with_capacity(items.len());

        for (position, item) in items.iter().enumerate() {
            let index = Signal::new(Value::from(position));
            let output = callback(&[item.clone(), Value::Cell(index.clone()), each.clone()])?;
            let key = ListKey::of(&explicit_key(&output, &index)?.unwrap_or_else(|| item.clone()));
            keys.insert(key.clone());

            let existing = retained
                .borrow()
                .get(&key)
                .map(|entry| (entry.node.clone(), entry.index.clone()));
            if let Some((node, index)) = existing {
                index.set(Value::from(position))?;
                node.set_list_slot(Some(ListSlot {
                    status: SlotStatus::Retained,
                    index: position,
                }));
                rendered.push(Value::Node(node));
                continue;
            }

            // Components returning child lists need a single root node.
            let wrap = matches!(
                &output,
                Value::Element(element)
                    if element.kind.is_component()
                        && matches!(element.children(), Some(Value::List(_)))
            );
            let output = if wrap {
                h("t-item", Props::new(), vec![output])
            } else {
                output
            };
            match untrack(|| jsx_render(&output, &options))? {
                Value::Node(node) => {
                    node.set_list_slot(Some(ListSlot {
                        status: SlotStatus::Inserted,
                        index: position,
                    }));
                    retained.borrow_mut().insert(
                        key,
                        Entry {
                            node: node.clone(),
                            index,
                        },
                    );
                    rendered.push(Value::Node(node));
                }
                markup => rendered.push(markup),
            }
        }

        evict(&retained, |key| !keys.contains(key));
        Ok(Value::list(rendered))
    }))
}

fn item_callback(props: &PropsProxy) -> Option<Callback> {
    match props.raw("children")? {
        Value::List(items) => match items.first()? {
            Value::Callback(callback) => Some(Rc::clone(callback)),
            _ => None,
        },
        Value::Callback(callback) => Some(callback),
        _ => None,
    }
}

/// The `key` prop of the element an item rendered to.
///
/// A thunk key is called; one that hands back the index cell itself means
/// the item has no key of its own. Falsy keys are ignored.
fn explicit_key(output: &Value, index: &Signal<Value>) -> Result<Option<Value>> {
    let Some(key) = output_key(output) else {
        return Ok(None);
    };
    let key = match key {
        Value::Thunk(thunk) => {
            let resolved = thunk()?;
            if matches!(&resolved, Value::Cell(cell) if cell == index) {
                return Ok(None);
            }
            resolved
        }
        Value::Derived(_) | Value::Cell(_) => key.current()?,
        other => other,
    };
    Ok(Some(key).filter(Value::is_truthy))
}

fn output_key(output: &Value) -> Option<Value> {
    match output {
        Value::Element(element) => element.key().cloned(),
        _ => None,
    }
}

/// Tag, drop and dispose retained entries matching `stale`.
fn evict(retained: &Retained, stale: impl Fn(&ListKey) -> bool) {
    let evicted: Vec<Entry> = {
        let mut entries = retained.borrow_mut();
        let keys: Vec<ListKey> = entries.keys().filter(|key| stale(key)).cloned().collect();
        keys.iter()
            .filter_map(|key| entries.shift_remove(key))
            .collect()
    };
    for entry in evicted {
        let index = entry.node.list_slot().map_or(0, |slot| slot.index);
        entry.node.set_list_slot(Some(ListSlot {
            status: SlotStatus::Deleted,
            index,
        }));
        trace!(node = entry.node.id().raw(), "evicting list item");
        entry.node.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{observe_mutations, take_mutations, Document, Mutation};
    use crate::props;
    use crate::reactive::on_unmount;
    use crate::render::{render_to_string, ElementType};
    use std::cell::Cell;

    fn letters(items: &[&str]) -> Value {
        Value::list(items.iter().map(|item| Value::from(*item)))
    }

    fn item_view() -> Value {
        Value::callback(|args: &[Value]| -> Result<Value> {
            Ok(h("li", props! {}, vec![args[0].clone()]))
        })
    }

    fn list_view(items: &Signal<Value>, fallback: Option<Value>) -> Value {
        let mut props = props! { "each" => items };
        if let Some(fallback) = fallback {
            props.insert("fallback".to_string(), fallback);
        }
        h(
            "ul",
            props! {},
            vec![h(ElementType::component(for_each), props, vec![item_view()])],
        )
    }

    fn mount(view: &Value) -> Node {
        let document = Document::install().unwrap();
        let node = match jsx_render(view, &RenderOptions::default()).unwrap() {
            Value::Node(node) => node,
            other => panic!("expected a node, got {other:?}"),
        };
        document.body().append_child(&node).unwrap();
        node
    }

    fn items_of(list: &Node) -> Vec<String> {
        list.children()
            .iter()
            .filter(|node| node.is_element())
            .map(Node::text_content)
            .collect()
    }

    #[test]
    fn renders_each_item() {
        let items = Signal::new(letters(&["a", "b", "c"]));
        let list = mount(&list_view(&items, None));
        assert_eq!(items_of(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn removing_the_middle_item_is_one_removal() {
        let items = Signal::new(letters(&["a", "b", "c"]));
        let list = mount(&list_view(&items, None));
        let (first, last) = (list.children()[1].clone(), list.children()[3].clone());

        observe_mutations();
        items.set(letters(&["a", "c"])).unwrap();
        let mutations = take_mutations();

        assert_eq!(items_of(&list), vec!["a", "c"]);
        let removals = mutations.iter().filter(|m| matches!(m, Mutation::Remove { .. })).count();
        let insertions = mutations.iter().filter(|m| matches!(m, Mutation::Insert { .. })).count();
        assert_eq!((removals, insertions), (1, 0));
        assert_eq!(list.children()[1], first);
        assert_eq!(list.children()[2], last);
    }

    #[test]
    fn appended_items_reuse_existing_nodes() {
        let items = Signal::new(letters(&["a"]));
        let list = mount(&list_view(&items, None));
        let kept = list.children()[1].clone();

        items.set(letters(&["a", "b"])).unwrap();
        assert_eq!(items_of(&list), vec!["a", "b"]);
        assert_eq!(list.children()[1], kept);

        items.set(letters(&["b", "a"])).unwrap();
        assert_eq!(items_of(&list), vec!["b", "a"]);
        assert_eq!(list.children()[2], kept);
    }

    #[test]
    fn index_cells_follow_moves() {
        let items = Signal::new(letters(&["a", "b"]));
        let view = h(
            "ul",
            props! {},
            vec![h(
                ElementType::component(for_each),
                props! { "each" => &items },
                vec![Value::callback(|args: &[Value]| -> Result<Value> {
                    let index = args[1].clone();
                    Ok(h(
                        "li",
                        props! { "key" => args[0].clone() },
                        vec![Value::thunk(move || index.current())],
                    ))
                })],
            )],
        );
        let list = mount(&view);
        assert_eq!(items_of(&list), vec!["0", "1"]);

        items.set(letters(&["b", "a"])).unwrap();
        assert_eq!(items_of(&list), vec!["0", "1"]);
        assert_eq!(list.children()[1].list_slot().map(|slot| slot.index), Some(0));
    }

    #[test]
    fn removed_items_are_disposed() {
        let disposed = Rc::new(Cell::new(0));
        let counter = disposed.clone();
        let items = Signal::new(letters(&["a", "b"]));
        let view = h(
            "ul",
            props! {},
            vec![h(
                ElementType::component(for_each),
                props! { "each" => &items },
                vec![Value::callback(move |args: &[Value]| -> Result<Value> {
                    let counter = counter.clone();
                    let item = ElementType::component(move |_| {
                        let counter = counter.clone();
                        on_unmount(move || counter.set(counter.get() + 1))?;
                        Ok(h("li", props! {}, vec![]))
                    });
                    Ok(h(item, props! { "key" => args[0].clone() }, vec![]))
                })],
            )],
        );
        mount(&view);

        items.set(letters(&["a"])).unwrap();
        assert_eq!(disposed.get(), 1);
    }

    #[test]
    fn fallback_shows_for_empty_lists() {
        let items = Signal::new(letters(&[]));
        let list = mount(&list_view(&items, Some(Value::from("nothing"))));
        assert_eq!(list.text_content(), "nothing");

        items.set(letters(&["a"])).unwrap();
        assert_eq!(items_of(&list), vec!["a"]);

        items.set(letters(&[])).unwrap();
        assert_eq!(list.text_content(), "nothing");
    }

    #[test]
    fn missing_callback_fails_eagerly() {
        let outcome = for_each(PropsProxy::new(props! { "each" => letters(&["a"]) }));
        assert!(matches!(outcome, Err(Error::MissingCallback)));
    }

    #[test]
    fn server_lists_render_markup() {
        let items = Signal::new(letters(&["x", "y"]));
        let markup = render_to_string(&list_view(&items, None)).unwrap();
        assert_eq!(markup, "<ul><li>x</li><li>y</li></ul>");
    }
}
