//! Declarative Values
//!
//! [`Value`] is what components produce and renderers consume: scalars,
//! text, lists, records, elements, already-rendered nodes and the reactive
//! shapes (untagged thunks, derived values and cells) that the client
//! renderer binds to the tree.

use std::fmt;
use std::rc::Rc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::env::jsx_render;
use super::{Element, Props};
use crate::config::RenderOptions;
use crate::dom::{Event, Handler, Node, NodeId};
use crate::error::Result;
use crate::reactive::{untrack, Computed, ErrorHandler, Memoize, Ref, Signal};

/// A zero-argument callable rendered as a derived value.
pub type Thunk = Rc<dyn Fn() -> Result<Value>>;

/// A callable taking positional arguments, such as a list item renderer or
/// an error boundary fallback.
pub type Callback = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A renderable value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    /// Pre-rendered markup, emitted verbatim.
    Markup(Rc<str>),
    List(Rc<[Value]>),
    Record(Rc<Props>),
    Element(Rc<Element>),
    Thunk(Thunk),
    Derived(Computed<Value>),
    Cell(Signal<Value>),
    Handler(Handler),
    Callback(Callback),
    Ref(Ref<Value>),
    Node(Node),
}

fn same_rc<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

fn rc_addr<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

impl Value {
    pub fn thunk(f: impl Fn() -> Result<Value> + 'static) -> Self {
        Self::Thunk(Rc::new(f))
    }

    pub fn handler(f: impl Fn(&Event) -> Result<()> + 'static) -> Self {
        Self::Handler(Rc::new(f))
    }

    pub fn callback(f: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Self::Callback(Rc::new(f))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn record(props: Props) -> Self {
        Self::Record(Rc::new(props))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, Self::Thunk(_) | Self::Derived(_) | Self::Cell(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Markup(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness as used by conditional rendering.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(flag) => *flag,
            Self::Number(number) => *number != 0.0 && !number.is_nan(),
            Self::Text(text) | Self::Markup(text) => !text.is_empty(),
            _ => true,
        }
    }

    /// Read through one reactive layer: thunks are called, derived values
    /// and cells are read (tracked). Everything else is returned as is.
    pub fn current(&self) -> Result<Value> {
        match self {
            Self::Thunk(thunk) => thunk(),
            Self::Derived(computed) => computed.get(),
            Self::Cell(cell) => Ok(cell.get()),
            other => Ok(other.clone()),
        }
    }

    /// Text used where a value is written into a text node or attribute.
    /// Null renders as empty text.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Recursive structural equality. Nodes compare with
    /// [`Node::is_equal_node`]; callables and reactive handles compare by
    /// identity.
    pub fn deep_equal(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => a.is_equal_node(b),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.deep_equal(y))
            }
            (Self::Record(a), Self::Record(b)) => props_deep_equal(a, b),
            (Self::Element(a), Self::Element(b)) => {
                a.kind.same_type(&b.kind) && props_deep_equal(&a.props, &b.props)
            }
            _ => false,
        }
    }

    /// Identity address of reference values, `0` for scalars.
    pub(crate) fn addr(&self) -> usize {
        match self {
            Self::List(items) => rc_addr(items),
            Self::Record(record) => rc_addr(record),
            Self::Element(element) => rc_addr(element),
            Self::Thunk(thunk) => rc_addr(thunk),
            Self::Handler(handler) => rc_addr(handler),
            Self::Callback(callback) => rc_addr(callback),
            Self::Derived(computed) => computed.addr(),
            Self::Cell(cell) => cell.addr(),
            Self::Ref(reference) => reference.addr(),
            _ => 0,
        }
    }
}

fn props_deep_equal(a: &Props, b: &Props) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| value.deep_equal(other)))
}

/// Strict equality: scalars and text by value, everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Markup(a), Self::Markup(b)) => a == b,
            (Self::List(a), Self::List(b)) => same_rc(a, b),
            (Self::Record(a), Self::Record(b)) => same_rc(a, b),
            (Self::Element(a), Self::Element(b)) => same_rc(a, b),
            (Self::Thunk(a), Self::Thunk(b)) => same_rc(a, b),
            (Self::Handler(a), Self::Handler(b)) => same_rc(a, b),
            (Self::Callback(a), Self::Callback(b)) => same_rc(a, b),
            (Self::Derived(a), Self::Derived(b)) => a == b,
            (Self::Cell(a), Self::Cell(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a == b,
            _ => false,
        }
    }
}

impl Memoize for Value {
    fn structural_eq(&self, other: &Self) -> bool {
        self.deep_equal(other)
    }

    fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    fn resolve(self) -> Result<Self> {
        match self {
            Self::Thunk(_) | Self::Derived(_) | Self::Cell(_) => self.current(),
            other => Ok(other),
        }
    }

    fn materialize(self, on_error: Option<&ErrorHandler<Self>>) -> Result<Self> {
        if !matches!(self, Self::Element(_)) {
            return Ok(self);
        }
        let options = RenderOptions::default().with_error_handler(on_error.cloned());
        untrack(|| jsx_render(&self, &options))
    }
}

fn format_number(number: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if number.is_nan() {
        f.write_str("NaN")
    } else if number.is_infinite() {
        f.write_str(if number > 0.0 { "Infinity" } else { "-Infinity" })
    } else if number == 0.0 {
        f.write_str("0")
    } else if number.fract() == 0.0 && number.abs() < 1e21 {
        write!(f, "{}", number as i128)
    } else {
        write!(f, "{number}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(number) => format_number(*number, f),
            Self::Text(text) | Self::Markup(text) => f.write_str(text),
            Self::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_null() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Derived(computed) => match computed.peek() {
                Some(value) => write!(f, "{value}"),
                None => Ok(()),
            },
            Self::Cell(cell) => write!(f, "{}", cell.peek()),
            Self::Node(node) => f.write_str(&node.text_content()),
            Self::Thunk(_) | Self::Handler(_) | Self::Callback(_) => f.write_str("function"),
            Self::Record(_) | Self::Element(_) | Self::Ref(_) => f.write_str("[object Object]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(flag) => f.debug_tuple("Bool").field(flag).finish(),
            Self::Number(number) => f.debug_tuple("Number").field(number).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Markup(html) => f.debug_tuple("Markup").field(html).finish(),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Record(record) => f.debug_map().entries(record.iter()).finish(),
            Self::Element(element) => fmt::Debug::fmt(element, f),
            Self::Thunk(_) => f.write_str("Thunk"),
            Self::Derived(computed) => f.debug_tuple("Derived").field(&computed.peek()).finish(),
            Self::Cell(cell) => f.debug_tuple("Cell").field(&cell.peek()).finish(),
            Self::Handler(_) => f.write_str("Handler"),
            Self::Callback(_) => f.write_str("Callback"),
            Self::Ref(reference) => fmt::Debug::fmt(reference, f),
            Self::Node(node) => fmt::Debug::fmt(node, f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null
            | Self::Thunk(_)
            | Self::Handler(_)
            | Self::Callback(_)
            | Self::Element(_) => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Number(number) => serializer.serialize_f64(*number),
            Self::Text(text) | Self::Markup(text) => serializer.serialize_str(text),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Record(record) => {
                let mut map = serializer.serialize_map(Some(record.len()))?;
                for (key, value) in record.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Derived(computed) => computed.peek().unwrap_or(Value::Null).serialize(serializer),
            Self::Cell(cell) => cell.peek().serialize(serializer),
            Self::Ref(reference) => reference.state().peek("current").unwrap_or(Value::Null).serialize(serializer),
            Self::Node(node) => serializer.serialize_str(&node.outer_html()),
        }
    }
}

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(number: $ty) -> Self {
                Self::Number(number as f64)
            }
        })*
    };
}

value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(Rc::from(text))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(Rc::from(text))
    }
}

impl From<Rc<str>> for Value {
    fn from(text: Rc<str>) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items.into())
    }
}

impl From<Props> for Value {
    fn from(props: Props) -> Self {
        Self::Record(Rc::new(props))
    }
}

impl From<Element> for Value {
    fn from(element: Element) -> Self {
        Self::Element(Rc::new(element))
    }
}

impl From<Computed<Value>> for Value {
    fn from(computed: Computed<Value>) -> Self {
        Self::Derived(computed)
    }
}

impl From<Signal<Value>> for Value {
    fn from(cell: Signal<Value>) -> Self {
        Self::Cell(cell)
    }
}

impl From<&Signal<Value>> for Value {
    fn from(cell: &Signal<Value>) -> Self {
        Self::Cell(cell.clone())
    }
}

impl From<Ref<Value>> for Value {
    fn from(reference: Ref<Value>) -> Self {
        Self::Ref(reference)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::Number(number) => Self::Number(number.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(text) => Self::from(text),
            serde_json::Value::Array(items) => Self::list(items.into_iter().map(Self::from)),
            serde_json::Value::Object(entries) => Self::from(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect::<Props>(),
            ),
        }
    }
}

// ----------------------------------------------------------------------------
// List keys
// ----------------------------------------------------------------------------

/// Hashable identity of a list item or explicit key.
///
/// Scalars key by value (`NaN` equals itself, `-0` equals `0`); reference
/// values key by identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ListKey {
    Null,
    Bool(bool),
    Number(u64),
    Text(Rc<str>),
    Node(NodeId),
    Identity(usize),
}

impl ListKey {
    pub(crate) fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) if number.is_nan() => Self::Number(f64::NAN.to_bits()),
            Value::Number(number) if *number == 0.0 => Self::Number(0f64.to_bits()),
            Value::Number(number) => Self::Number(number.to_bits()),
            Value::Text(text) | Value::Markup(text) => Self::Text(Rc::clone(text)),
            Value::Node(node) => Self::Node(node.id()),
            other => Self::Identity(other.addr()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;

    #[test]
    fn strict_equality_compares_references_by_identity() {
        let list = Value::list([Value::from(1)]);
        assert_eq!(list, list.clone());
        assert_ne!(list, Value::list([Value::from(1)]));
        assert_eq!(Value::from("a"), Value::from("a"));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn deep_equality_recurses() {
        let a = Value::from(props! { "x" => 1, "y" => Value::list([Value::from("z")]) });
        let b = Value::from(props! { "x" => 1, "y" => Value::list([Value::from("z")]) });
        let c = Value::from(props! { "x" => 2, "y" => Value::list([Value::from("z")]) });

        assert!(a.deep_equal(&b));
        assert!(!a.deep_equal(&c));
        assert!(!Value::from(1).deep_equal(&Value::from("1")));
    }

    #[test]
    fn deep_equality_compares_nodes_structurally() {
        let first = Node::element("p");
        first.set_attribute("class", "x");
        let second = Node::element("p");
        second.set_attribute("class", "x");

        assert!(Value::from(first).deep_equal(&Value::from(second)));
    }

    #[test]
    fn numbers_display_like_markup_text() {
        assert_eq!(Value::from(6).to_string(), "6");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Null.to_text(), "");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::list([]).is_truthy());
    }

    #[test]
    fn current_reads_through_reactive_layers() {
        let cell = Signal::new(Value::from(3));
        assert_eq!(Value::from(&cell).current().unwrap(), Value::from(3));
        assert_eq!(Value::thunk(|| Ok(Value::from("t"))).current().unwrap(), Value::from("t"));
        assert_eq!(Value::from(1).current().unwrap(), Value::from(1));
    }

    #[test]
    fn converts_from_and_serializes_to_json() {
        let json = serde_json::json!({ "name": "a", "tags": [1, true, null] });
        let value = Value::from(json);
        assert_eq!(serde_json::to_value(&value).unwrap(), serde_json::json!({
            "name": "a",
            "tags": [1.0, true, null],
        }));
    }

    #[test]
    fn list_keys_follow_same_value_zero() {
        assert_eq!(ListKey::of(&Value::from(0.0)), ListKey::of(&Value::from(-0.0)));
        assert_eq!(
            ListKey::of(&Value::Number(f64::NAN)),
            ListKey::of(&Value::Number(f64::NAN))
        );
        assert_eq!(ListKey::of(&Value::from("k")), ListKey::of(&Value::from("k")));

        let list = Value::list([]);
        assert_eq!(ListKey::of(&list), ListKey::of(&list.clone()));
        assert_ne!(ListKey::of(&list), ListKey::of(&Value::list([])));
    }
}
