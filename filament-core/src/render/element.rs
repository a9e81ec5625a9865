//! Element descriptions and the `create_element` entry point.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture};

use super::{Props, PropsProxy, Value};
use crate::error::Result;

/// A synchronous component.
pub type Component = Rc<dyn Fn(PropsProxy) -> Result<Value>>;

/// A component resolved by `suspense`.
pub type AsyncComponent = Rc<dyn Fn(PropsProxy) -> LocalBoxFuture<'static, Result<Value>>>;

/// What an element renders as.
#[derive(Clone)]
pub enum ElementType {
    Tag(Rc<str>),
    Component(Component),
    /// Renders its children without a wrapper.
    Fragment,
    Async(AsyncComponent),
}

impl ElementType {
    pub fn component(f: impl Fn(PropsProxy) -> Result<Value> + 'static) -> Self {
        Self::Component(Rc::new(f))
    }

    pub fn async_component<F, Fut>(f: F) -> Self
    where
        F: Fn(PropsProxy) -> Fut + 'static,
        Fut: Future<Output = Result<Value>> + 'static,
    {
        Self::Async(Rc::new(move |props| f(props).boxed_local()))
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_) | Self::Async(_))
    }

    /// Tags compare by name, components by identity.
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Tag(a), Self::Tag(b)) => a == b,
            (Self::Component(a), Self::Component(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
            }
            (Self::Async(a), Self::Async(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
            }
            (Self::Fragment, Self::Fragment) => true,
            _ => false,
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        Self::Tag(Rc::from(tag))
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        Self::Tag(Rc::from(tag))
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Self::Component(_) => f.write_str("Component"),
            Self::Fragment => f.write_str("Fragment"),
            Self::Async(_) => f.write_str("Async"),
        }
    }
}

/// A declarative element: a type plus its props.
#[derive(Clone)]
pub struct Element {
    pub kind: ElementType,
    pub props: Props,
}

impl Element {
    pub fn new(kind: impl Into<ElementType>, props: Props) -> Self {
        Self {
            kind: kind.into(),
            props,
        }
    }

    pub fn key(&self) -> Option<&Value> {
        self.props.get("key")
    }

    pub fn children(&self) -> Option<&Value> {
        self.props.get("children")
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .finish()
    }
}

/// Build an element value. Non-empty `children` replace `props["children"]`
/// with a list.
///
/// ```rust,ignore
/// let item = create_element("li", props! { "className" => "done" }, vec!["milk".into()]);
/// ```
pub fn create_element(kind: impl Into<ElementType>, props: Props, children: Vec<Value>) -> Value {
    let mut props = props;
    if !children.is_empty() {
        props.insert("children".to_string(), Value::from(children));
    }
    Value::Element(Rc::new(Element {
        kind: kind.into(),
        props,
    }))
}

/// Short alias of [`create_element`].
pub fn h(kind: impl Into<ElementType>, props: Props, children: Vec<Value>) -> Value {
    create_element(kind, props, children)
}

pub fn is_valid_element(value: &Value) -> bool {
    matches!(value, Value::Element(_))
}
