//! Client Renderer
//!
//! Materializes values into the headless document.
//!
//! # Reactive bindings
//!
//! Thunks are wrapped in a derived value; derived values and cells are bound
//! with a watcher. The first value is rendered immediately. When it changes:
//!
//! 1. A list change is offered to the keyed list reconciler first.
//! 2. Otherwise the new value is rendered. If the binding produced a
//!    fragment, everything between its two comment sentinels is disposed
//!    and replaced; a single node is disposed and replaced in place.
//!
//! Watchers, derived values and event listeners register their teardown in
//! the open cleanup scope, so disposing the node a render produced releases
//! every binding created under it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{trace, warn};

use super::attr::{
    attr_name, event_name, is_event, is_non_update_attr, is_reserved_prop, is_void_element,
    namespace_for, obj_to_str, parse_int, reflects_property, INNER_HTML,
};
use super::{Element, ElementType, PropsProxy, Value};
use crate::config::RenderOptions;
use crate::dom::{DomError, Event, Handler, Node};
use crate::error::{Error, Result};
use crate::flow::reconcile_lists;
use crate::reactive::{
    collect_cleanups, on_unmount, register_disposer, untrack, Computed, SubscriberId,
};

/// Render `value` and append it to `root`. Does nothing without a root.
pub fn render(value: &Value, root: Option<&Node>) -> Result<()> {
    let Some(root) = root else {
        return Ok(());
    };
    let node = render_with_cleanup(value, &RenderOptions::default())?;
    root.append_child(&node)?;
    Ok(())
}

/// Dispose every binding under `node` and detach it.
pub fn unmount(node: &Node) {
    node.dispose();
    node.remove();
}

/// Render while collecting cleanups onto the produced node.
///
/// Fragments hand their cleanups to their first child, since the fragment
/// itself is emptied when inserted.
pub(crate) fn render_with_cleanup(value: &Value, options: &RenderOptions) -> Result<Node> {
    let (rendered, disposers) = collect_cleanups(|| render_to_node(value, options));
    let node = match rendered {
        Ok(node) => node,
        Err(err) => {
            for dispose in disposers {
                dispose();
            }
            return Err(err);
        }
    };
    if disposers.is_empty() {
        return Ok(node);
    }
    match node.first_child() {
        Some(first) if node.is_fragment() => first.add_fragment_cleanups(disposers),
        _ => node.add_cleanups(disposers),
    }
    Ok(node)
}

/// Materialize a value into a node.
pub fn render_to_node(value: &Value, options: &RenderOptions) -> Result<Node> {
    match value {
        Value::Null | Value::Bool(_) => Ok(Node::text("")),
        Value::Number(_) | Value::Text(_) => Ok(Node::text(value.to_string())),
        Value::Markup(html) => Ok(Node::raw(html.to_string())),
        Value::List(items) => {
            let fragment = Node::fragment();
            for item in items.iter() {
                fragment.append_child(&render_to_node(item, options)?)?;
            }
            Ok(fragment)
        }
        Value::Thunk(thunk) => {
            let thunk = Rc::clone(thunk);
            bind_thunk(Box::new(move || thunk()), options)
        }
        Value::Callback(callback) => {
            let callback = Rc::clone(callback);
            bind_thunk(Box::new(move || callback(&[])), options)
        }
        Value::Derived(_) | Value::Cell(_) => reaction(value, options),
        Value::Element(element) => render_element(element, options),
        Value::Node(node) => Ok(node.clone()),
        Value::Record(_) | Value::Handler(_) | Value::Ref(_) => Ok(Node::text(value.to_string())),
    }
}

fn bind_thunk(compute: Box<dyn Fn() -> Result<Value>>, options: &RenderOptions) -> Result<Node> {
    let computed = Computed::build(compute, options.on_error.clone());
    let owned = computed.clone();
    register_disposer(SubscriberId::new(), move || owned.dispose());
    reaction(&Value::Derived(computed), options)
}

// ----------------------------------------------------------------------------
// Reactive bindings
// ----------------------------------------------------------------------------

/// Where a binding's output currently lives.
#[derive(Clone)]
enum Anchor {
    Node(Node),
    Range { start: Node, end: Node },
}

impl Anchor {
    /// Fragments are bracketed by comment sentinels, unless their content
    /// already starts with the sentinels of a nested binding.
    fn of(node: &Node) -> Result<Self> {
        if !node.is_fragment() {
            return Ok(Self::Node(node.clone()));
        }
        let bracketed = node.first_child().is_some_and(|first| first.is_range_start());
        if !bracketed {
            let start = Node::comment("");
            start.mark_range_start();
            node.prepend(&start)?;
            node.append_child(&Node::comment(""))?;
        }
        match (node.first_child(), node.last_child()) {
            (Some(start), Some(end)) => Ok(Self::Range { start, end }),
            _ => Err(DomError::Detached.into()),
        }
    }
}

/// Watch a derived value or cell. The watcher is released with the
/// enclosing cleanup scope.
fn subscribe(source: &Value, callback: impl Fn(&Value, &Value) -> Result<()> + 'static) {
    match source {
        Value::Derived(computed) => {
            let id = computed.watch(callback);
            let owned = computed.clone();
            register_disposer(SubscriberId::new(), move || owned.unwatch(id));
        }
        Value::Cell(cell) => {
            let id = cell.watch(callback);
            let owned = cell.clone();
            register_disposer(SubscriberId::new(), move || owned.unsubscribe(id));
        }
        _ => {}
    }
}

fn reaction(source: &Value, options: &RenderOptions) -> Result<Node> {
    let initial = untrack(|| source.current())?;
    let node = render_to_node(&initial, options)?;
    let anchor = Rc::new(RefCell::new(Anchor::of(&node)?));
    let options = options.clone();

    subscribe(source, move |next, previous| {
        if reconcile_lists(next, previous)? {
            return Ok(());
        }
        let rendered = render_with_cleanup(next, &options)?;
        let current = anchor.borrow().clone();
        match current {
            Anchor::Range { start, end } => replace_range(&start, &end, &rendered),
            Anchor::Node(old) => {
                *anchor.borrow_mut() = Anchor::of(&rendered)?;
                trace!(old = old.id().raw(), new = rendered.id().raw(), "replacing reactive node");
                old.dispose();
                old.replace_with(&rendered)?;
                Ok(())
            }
        }
    });
    Ok(node)
}

/// Dispose and remove everything strictly between the sentinels, then
/// insert `replacement` before `end`.
fn replace_range(start: &Node, end: &Node, replacement: &Node) -> Result<()> {
    let Some(parent) = end.parent() else {
        warn!(end = end.id().raw(), "reactive range is detached; skipping update");
        return Ok(());
    };
    let mut cursor = start.next_sibling();
    while let Some(node) = cursor {
        if &node == end {
            break;
        }
        cursor = node.next_sibling();
        node.dispose();
        parent.remove_child(&node)?;
    }
    parent.insert_before(replacement, Some(end))?;
    Ok(())
}

// ----------------------------------------------------------------------------
// Elements
// ----------------------------------------------------------------------------

fn render_element(element: &Element, options: &RenderOptions) -> Result<Node> {
    let tag = match &element.kind {
        ElementType::Component(component) => {
            let output = component(PropsProxy::new(element.props.clone()))?;
            return render_to_node(&output, options);
        }
        ElementType::Fragment => {
            let children = element.children().cloned().unwrap_or(Value::Null);
            return render_to_node(&children, options);
        }
        ElementType::Async(_) => return Err(Error::UnresolvedAsync),
        ElementType::Tag(tag) => tag,
    };

    let namespace = options.namespace.or_else(|| namespace_for(tag));
    let options = options.within(namespace);
    let node = Node::element_ns(tag, namespace);
    let props = &element.props;

    for (key, value) in props {
        apply_attr(&node, key, value, &options)?;
    }
    if let Some(Value::Ref(reference)) = props.get("ref") {
        reference.set_current(Value::Node(node.clone()))?;
    }
    if is_void_element(tag) {
        return Ok(node);
    }

    if let Some(html) = props.get(INNER_HTML).and_then(inner_html) {
        node.set_inner_html(&html);
    } else if let Some(children) = props.get("children").filter(|children| !children.is_null()) {
        node.append_child(&render_to_node(children, &options)?)?;
    }

    if &**tag == "select" {
        if let Some(selected) = props.get("bind:value").or_else(|| props.get("value")) {
            select_options(&node, &untrack(|| selected.current())?);
        }
    }
    Ok(node)
}

/// The markup of a `dangerouslySetInnerHTML` prop: `{ __html }` or text.
pub(crate) fn inner_html(value: &Value) -> Option<String> {
    match value {
        Value::Record(record) => record.get("__html").map(Value::to_text),
        Value::Text(html) | Value::Markup(html) => Some(html.to_string()),
        _ => None,
    }
}

/// Apply one prop to an element.
pub(crate) fn apply_attr(
    node: &Node,
    key: &str,
    value: &Value,
    options: &RenderOptions,
) -> Result<()> {
    if is_reserved_prop(key) || key == INNER_HTML {
        return Ok(());
    }
    let name = attr_name(key);

    if let Some(bound) = name.strip_prefix("bind:") {
        if let Value::Cell(cell) = value {
            let event = if bound == "value" { "onInput" } else { "onChange" };
            let cell = cell.clone();
            let handler: Handler = Rc::new(move |event: &Event| -> Result<()> {
                let target = event.current_target().unwrap_or_else(|| event.target().clone());
                cell.set(read_input(&target))
            });
            add_event(node, event, handler)?;
        }
        return apply_attr(node, bound, value, options);
    }

    match value {
        Value::Derived(_) | Value::Cell(_) => {
            let target = node.downgrade();
            let (watched_name, watched_options) = (name.clone(), options.clone());
            subscribe(value, move |next, _| match target.upgrade() {
                Some(node) => apply_attr(&node, &watched_name, next, &watched_options),
                None => Ok(()),
            });
            let initial = untrack(|| value.current())?;
            apply_attr(node, &name, &initial, options)
        }
        Value::Handler(handler) if is_event(&name) => add_event(node, key, Rc::clone(handler)),
        Value::Handler(_) => Ok(()),
        Value::Callback(callback) if is_event(&name) => {
            let callback = Rc::clone(callback);
            let handler: Handler = Rc::new(move |_: &Event| -> Result<()> {
                callback(&[])?;
                Ok(())
            });
            add_event(node, key, handler)
        }
        Value::Callback(_) => Ok(()),
        Value::Thunk(thunk) if is_event(&name) => {
            let thunk = Rc::clone(thunk);
            let handler: Handler = Rc::new(move |_: &Event| -> Result<()> {
                thunk()?;
                Ok(())
            });
            add_event(node, key, handler)
        }
        Value::Thunk(thunk) => {
            let thunk = Rc::clone(thunk);
            let computed = Computed::build(Box::new(move || thunk()), options.on_error.clone());
            let owned = computed.clone();
            register_disposer(SubscriberId::new(), move || owned.dispose());
            apply_attr(node, &name, &Value::Derived(computed), options)
        }
        Value::Record(record) => {
            let serialized = Value::from(obj_to_str(record, &name));
            apply_attr(node, &name, &serialized, options)
        }
        _ => {
            apply_scalar(node, &name, value);
            Ok(())
        }
    }
}

fn apply_scalar(node: &Node, name: &str, value: &Value) {
    let absent = matches!(value, Value::Null | Value::Bool(false));
    if name == "value" {
        let value = if absent { Value::Null } else { value.clone() };
        match node.tag_name() {
            Some("select") => select_options(node, &value),
            Some("textarea") => {
                node.set_text_content(&value.to_text());
                node.set_property(name, value);
            }
            _ => node.set_property(name, value),
        }
    } else if !is_non_update_attr(name) && reflects_property(name) {
        node.set_property(name, value.clone());
    }

    if !absent {
        let text = match value {
            Value::Bool(true) => String::new(),
            other => other.to_string(),
        };
        node.set_attribute(name, text);
    }
}

/// Attach a listener and detach it when the enclosing scope is disposed.
fn add_event(node: &Node, key: &str, handler: Handler) -> Result<()> {
    let (event, capture) = event_name(key);
    let id = node.add_event_listener(&event, handler, capture);
    let target = node.downgrade();
    on_unmount(move || {
        if let Some(node) = target.upgrade() {
            node.remove_event_listener(id);
        }
    })?;
    Ok(())
}

fn option_value(option: &Node) -> Value {
    option
        .property("value")
        .or_else(|| option.attribute("value").map(Value::from))
        .unwrap_or_else(|| Value::from(option.text_content()))
}

/// The value a form control reports on input.
///
/// Multi-selects report the values of their selected options; number
/// inputs parse their value as an integer.
fn read_input(target: &Node) -> Value {
    let multiple = target.property("multiple").is_some_and(|flag| flag.is_truthy());
    if multiple && target.tag_name() == Some("select") {
        return Value::list(target.selected_options().iter().map(option_value));
    }

    let data = target.property("value").unwrap_or(Value::Null);
    let numeric = target.attribute("type").as_deref() == Some("number");
    if numeric && !data.is_null() && data.as_str() != Some("") {
        return Value::Number(parse_int(&data.to_text()));
    }
    data
}

/// Mark the `option` descendants matching `selected` (any of them, for a
/// list).
fn select_options(select: &Node, selected: &Value) {
    if selected.is_null() {
        return;
    }
    for option in select.descendants() {
        if option.tag_name() != Some("option") {
            continue;
        }
        let value = option_value(&option);
        let chosen = match selected {
            Value::List(items) => items.iter().any(|item| item == &value),
            single => single == &value,
        };
        option.set_property("selected", Value::Bool(chosen));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::props;
    use crate::reactive::{batch, on_unmount, Ref, Signal};
    use crate::render::attr::SVG_NS;
    use crate::render::h;
    use std::cell::Cell;

    fn client() -> Document {
        Document::install().unwrap()
    }

    #[test]
    fn renders_scalars_and_lists() {
        client();
        let options = RenderOptions::default();

        assert_eq!(render_to_node(&Value::Null, &options).unwrap().text_content(), "");
        assert_eq!(render_to_node(&Value::from(1.5), &options).unwrap().text_content(), "1.5");

        let list = Value::list([Value::from("a"), Value::from(2)]);
        let fragment = render_to_node(&list, &options).unwrap();
        assert!(fragment.is_fragment());
        assert_eq!(fragment.inner_html(), "a2");
    }

    #[test]
    fn renders_elements_with_attributes() {
        client();
        let element = h(
            "label",
            props! { "className" => "field", "htmlFor" => "name", "hidden" => true, "title" => Value::Null },
            vec![Value::from("Name")],
        );
        let node = render_to_node(&element, &RenderOptions::default()).unwrap();
        assert_eq!(
            node.outer_html(),
            "<label class=\"field\" for=\"name\" hidden>Name</label>"
        );
        assert_eq!(node.property("hidden"), Some(Value::Bool(true)));
    }

    #[test]
    fn styles_serialize_with_units() {
        client();
        let element = h(
            "div",
            props! { "style" => props! { "marginTop" => 4, "opacity" => 0.5 } },
            vec![],
        );
        let node = render_to_node(&element, &RenderOptions::default()).unwrap();
        assert_eq!(node.attribute("style").as_deref(), Some("margin-top:4px;opacity:0.5;"));
    }

    #[test]
    fn svg_namespace_is_inherited_by_descendants_only() {
        client();
        let tree = h(
            "div",
            props! {},
            vec![
                h("svg", props! {}, vec![h("circle", props! {}, vec![])]),
                h("span", props! {}, vec![]),
            ],
        );
        let node = render_to_node(&tree, &RenderOptions::default()).unwrap();
        let children = node.children();
        let svg = &children[0];

        assert_eq!(svg.namespace(), Some(SVG_NS));
        assert_eq!(svg.first_child().and_then(|circle| circle.namespace()), Some(SVG_NS));
        assert_eq!(children[1].namespace(), None);
    }

    #[test]
    fn components_receive_props() {
        client();
        let greeting = ElementType::component(|props: PropsProxy| {
            Ok(h("p", props! {}, vec![Value::from(format!("Hi {}", props.get("name")?))]))
        });
        let node = render_to_node(
            &h(greeting, props! { "name" => "Ada" }, vec![]),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(node.outer_html(), "<p>Hi Ada</p>");
    }

    #[test]
    fn thunks_update_text_in_place() {
        client();
        let count = Signal::new(Value::from(1));
        let reader = count.clone();
        let view = h(
            "p",
            props! {},
            vec![Value::thunk(move || Ok(Value::from(format!("n={}", reader.get()))))],
        );

        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();
        assert_eq!(node.text_content(), "n=1");

        count.set(Value::from(2)).unwrap();
        assert_eq!(node.text_content(), "n=2");
    }

    #[test]
    fn reactive_fragments_replace_between_sentinels() {
        client();
        let items = Signal::new(Value::list([Value::from("a"), Value::from("b")]));
        let view = h("div", props! {}, vec![Value::from(&items), Value::from("!")]);

        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();
        assert_eq!(node.inner_html(), "<!---->ab<!---->!");

        items.set(Value::list([Value::from("c")])).unwrap();
        assert_eq!(node.inner_html(), "<!---->c<!---->!");

        items.set(Value::from("single")).unwrap();
        assert_eq!(node.inner_html(), "<!---->single<!---->!");
    }

    #[test]
    fn reactive_attributes_follow_their_source() {
        client();
        let class = Signal::new(Value::from("off"));
        let view = h("button", props! { "className" => &class }, vec![]);
        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();

        assert_eq!(node.attribute("class").as_deref(), Some("off"));
        class.set(Value::from("on")).unwrap();
        assert_eq!(node.attribute("class").as_deref(), Some("on"));
        class.set(Value::Null).unwrap();
        assert_eq!(node.attribute("class").as_deref(), Some("on"));
    }

    #[test]
    fn events_dispatch_and_are_removed_on_dispose() {
        client();
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let view = h(
            "button",
            props! {
                "onClick" => Value::handler(move |_| {
                    counter.set(counter.get() + 1);
                    Ok(())
                }),
            },
            vec![],
        );

        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();
        node.dispatch_event("click").unwrap();
        assert_eq!(clicks.get(), 1);

        node.dispose();
        node.dispatch_event("click").unwrap();
        assert_eq!(clicks.get(), 1);
        assert_eq!(node.listener_count("click"), 0);
    }

    #[test]
    fn capture_listeners_run_before_the_target() {
        client();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (outer_log, inner_log) = (log.clone(), log.clone());
        let view = h(
            "div",
            props! {
                "onClickCapture" => Value::handler(move |_| {
                    outer_log.borrow_mut().push("outer");
                    Ok(())
                }),
            },
            vec![h(
                "button",
                props! {
                    "onClick" => Value::handler(move |_| {
                        inner_log.borrow_mut().push("inner");
                        Ok(())
                    }),
                },
                vec![],
            )],
        );

        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();
        let button = node.first_child().unwrap();
        button.dispatch_event("click").unwrap();
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn bound_inputs_write_back() {
        client();
        let name = Signal::new(Value::from("a"));
        let view = h("input", props! { "bind:value" => &name }, vec![]);
        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();
        assert_eq!(node.property("value"), Some(Value::from("a")));

        node.set_property("value", Value::from("typed"));
        node.dispatch_event("input").unwrap();
        assert_eq!(name.peek(), Value::from("typed"));
    }

    #[test]
    fn numeric_inputs_parse_integers() {
        client();
        let amount = Signal::new(Value::from(0));
        let view = h("input", props! { "type" => "number", "bind:value" => &amount }, vec![]);
        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();

        node.set_property("value", Value::from("42.7"));
        node.dispatch_event("input").unwrap();
        assert_eq!(amount.peek(), Value::from(42));

        node.set_property("value", Value::from("abc"));
        node.dispatch_event("input").unwrap();
        assert!(amount.peek().as_f64().is_some_and(f64::is_nan));
    }

    #[test]
    fn selects_mark_matching_options() {
        client();
        let choice = Signal::new(Value::from("b"));
        let option = |value: &str| h("option", props! { "value" => value }, vec![Value::from(value)]);
        let view = h(
            "select",
            props! { "bind:value" => &choice },
            vec![option("a"), option("b")],
        );
        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();
        let selected = |node: &Node| {
            node.selected_options()
                .iter()
                .map(|option| option.text_content())
                .collect::<Vec<_>>()
        };
        assert_eq!(selected(&node), vec!["b"]);

        choice.set(Value::from("a")).unwrap();
        assert_eq!(selected(&node), vec!["a"]);
    }

    #[test]
    fn multi_selects_report_lists() {
        client();
        let picked = Signal::new(Value::list([Value::from("a"), Value::from("c")]));
        let option = |value: &str| h("option", props! { "value" => value }, vec![Value::from(value)]);
        let view = h(
            "select",
            props! { "multiple" => true, "bind:value" => &picked },
            vec![option("a"), option("b"), option("c")],
        );
        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();
        assert_eq!(node.selected_options().len(), 2);

        node.children()[1].set_property("selected", Value::Bool(true));
        node.dispatch_event("change").unwrap();
        let reported: Vec<String> = picked
            .peek()
            .as_list()
            .unwrap_or_default()
            .iter()
            .map(Value::to_text)
            .collect();
        assert_eq!(reported, vec!["a", "b", "c"]);
    }

    #[test]
    fn refs_receive_the_node() {
        client();
        let reference = Ref::new(Value::Null);
        let view = h("canvas", props! { "ref" => reference.clone() }, vec![]);
        let node = render_to_node(&view, &RenderOptions::default()).unwrap();
        assert_eq!(reference.current(), Value::Node(node));
    }

    #[test]
    fn inner_html_skips_children() {
        client();
        let view = h(
            "div",
            props! { "dangerouslySetInnerHTML" => props! { "__html" => "<b>x</b>" } },
            vec![Value::from("ignored")],
        );
        let node = render_to_node(&view, &RenderOptions::default()).unwrap();
        assert_eq!(node.outer_html(), "<div><b>x</b></div>");
    }

    #[test]
    fn textarea_value_becomes_text() {
        client();
        let view = h("textarea", props! { "value" => "draft" }, vec![]);
        let node = render_to_node(&view, &RenderOptions::default()).unwrap();
        assert_eq!(node.text_content(), "draft");
        assert_eq!(node.property("value"), Some(Value::from("draft")));
    }

    #[test]
    fn async_components_need_suspense() {
        client();
        let lazy = ElementType::async_component(|_| async { Ok(Value::Null) });
        let outcome = render_to_node(&h(lazy, props! {}, vec![]), &RenderOptions::default());
        assert!(matches!(outcome, Err(Error::UnresolvedAsync)));
    }

    #[test]
    fn unmount_runs_cleanups_once() {
        let document = client();
        let unmounted = Rc::new(Cell::new(0));
        let counter = unmounted.clone();
        let component = ElementType::component(move |_| {
            let counter = counter.clone();
            on_unmount(move || counter.set(counter.get() + 1))?;
            Ok(h("p", props! {}, vec![]))
        });

        render(&h(component, props! {}, vec![]), Some(&document.body())).unwrap();
        let rendered = document.body().last_child().unwrap();

        unmount(&rendered);
        rendered.dispose();
        assert_eq!(unmounted.get(), 1);
        assert!(rendered.parent().is_none());
    }

    #[test]
    fn batched_updates_patch_once() {
        client();
        let count = Signal::new(Value::from(0));
        let reader = count.clone();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let view = h(
            "span",
            props! {},
            vec![Value::thunk(move || {
                counter.set(counter.get() + 1);
                Ok(reader.get())
            })],
        );
        let node = render_with_cleanup(&view, &RenderOptions::default()).unwrap();

        batch(|| {
            count.set(Value::from(1))?;
            count.set(Value::from(2))
        })
        .unwrap();
        assert_eq!(node.text_content(), "2");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn render_without_root_is_a_no_op() {
        client();
        assert!(render(&Value::from("x"), None).is_ok());
    }
}
