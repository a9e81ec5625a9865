//! Conditional rendering and error recovery.

use std::cell::{Cell, OnceCell};
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::config::RenderOptions;
use crate::error::{Error, Result};
use crate::reactive::{untrack, ErrorHandler, Signal};
use crate::render::{create_element, jsx_render, ElementType, Props, PropsProxy, Value};

fn fragment(content: Value) -> Value {
    create_element(ElementType::Fragment, Props::new(), vec![content])
}

/// Render `children` while `when` is truthy, otherwise `fallback`.
pub fn show(props: PropsProxy) -> Result<Value> {
    Ok(Value::thunk(move || {
        let branch = if props.get("when")?.is_truthy() {
            "children"
        } else {
            "fallback"
        };
        Ok(fragment(props.raw(branch).unwrap_or(Value::Null)))
    }))
}

/// Render the first [`match_case`] child whose `when` is truthy, otherwise
/// `fallback`.
///
/// ```rust,ignore
/// h(ElementType::component(switch), props! { "fallback" => "none" }, vec![
///     h(ElementType::component(match_case), props! { "when" => &is_admin }, vec!["admin".into()]),
///     h(ElementType::component(match_case), props! { "when" => &is_user }, vec!["user".into()]),
/// ])
/// ```
pub fn switch(props: PropsProxy) -> Result<Value> {
    Ok(Value::thunk(move || {
        for child in props.child_list() {
            let Value::Element(element) = &child else {
                continue;
            };
            let when = element.props.get("when").cloned().unwrap_or(Value::Null);
            if when.current()?.is_truthy() {
                return Ok(fragment(child));
            }
        }
        Ok(fragment(props.raw("fallback").unwrap_or(Value::Null)))
    }))
}

/// A branch of [`switch`]. Renders its children.
pub fn match_case(props: PropsProxy) -> Result<Value> {
    Ok(props.raw("children").unwrap_or(Value::Null))
}

/// Always fails with the `error` prop as message.
pub fn throw_error(props: PropsProxy) -> Result<Value> {
    Err(Error::Thrown(props.get("error")?.to_text()))
}

struct Boundary {
    current: Signal<Value>,
    fallback: Value,
    handler: OnceCell<ErrorHandler<Value>>,
    failed: Cell<bool>,
}

impl Boundary {
    fn render(&self, value: &Value) -> Result<Value> {
        let options = RenderOptions::default().with_error_handler(self.handler.get().cloned());
        untrack(|| jsx_render(value, &options))
    }

    /// Tear down what is shown and switch to the fallback.
    fn recover(&self, error: Error) -> Result<Value> {
        warn!(%error, "error boundary caught a failure");
        if let Value::Node(node) = self.current.peek() {
            node.dispose();
        }
        let fallback = match &self.fallback {
            Value::Callback(callback) => callback(&[Value::from(error.to_string())])?,
            other => other.clone(),
        };
        self.failed.set(true);
        let rendered = self.render(&fallback)?;
        self.current.set(rendered)?;
        Ok(Value::Null)
    }
}

/// Render children; when a derived value under them fails, dispose them and
/// show `fallback` instead.
///
/// `fallback` is either a callback receiving the error message or a value.
pub fn error_boundary(props: PropsProxy) -> Result<Value> {
    let boundary = Rc::new(Boundary {
        current: Signal::new(Value::Null),
        fallback: props.raw("fallback").unwrap_or(Value::Null),
        handler: OnceCell::new(),
        failed: Cell::new(false),
    });
    let weak: Weak<Boundary> = Rc::downgrade(&boundary);
    let handler: ErrorHandler<Value> = Rc::new(move |error: Error| -> Result<Value> {
        match weak.upgrade() {
            Some(boundary) => boundary.recover(error),
            None => Err(error),
        }
    });
    let _ = boundary.handler.set(handler);

    let children = create_element(ElementType::Fragment, Props::new(), props.child_list());
    match boundary.render(&children) {
        Ok(rendered) if boundary.failed.get() => {
            if let Value::Node(node) = rendered {
                node.dispose();
            }
        }
        Ok(rendered) => boundary.current.set(rendered)?,
        Err(error) => {
            boundary.recover(error)?;
        }
    }

    Ok(Value::thunk(move || Ok(boundary.current.get())))
}
