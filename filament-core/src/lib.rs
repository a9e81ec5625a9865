//! Filament Core
//!
//! This crate provides the runtime for the Filament fine-grained reactive
//! UI library. It implements:
//!
//! - Reactive primitives (signals, derived values, effects, batches, state)
//! - A headless document the client renderer writes into
//! - Client and server renderers for declarative element trees
//! - Control flow components (conditionals, keyed lists, error and async
//!   boundaries)
//!
//! There is no virtual DOM. A reactive value placed in a tree is bound to
//! the exact node it produced, and only that node changes when the value
//! does.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Signals, derived values, effects and dependency tracking
//! - `dom`: The headless node tree, events and animation frames
//! - `render`: Values, elements, props and both renderers
//! - `flow`: Control flow components and keyed list reconciliation
//! - `config`: Render and page options
//!
//! Everything is single-threaded. Handles are `Rc`-based and `!Send`; each
//! thread owns its own reactive graph, document and render mode.
//!
//! # Example
//!
//! ```rust,ignore
//! use filament_core::{batch, h, props, render, Computed, Document, Signal, Value};
//!
//! let document = Document::install()?;
//! let count = Signal::new(Value::from(0));
//!
//! let reader = count.clone();
//! let doubled = Computed::new(move || {
//!     Value::from(reader.get().as_f64().unwrap_or(0.0) * 2.0)
//! });
//!
//! render(&h("p", props! {}, vec![doubled.into()]), Some(&document.body()))?;
//!
//! batch(|| {
//!     count.set(Value::from(1))?;
//!     count.set(Value::from(3))
//! })?;
//! assert_eq!(document.body().text_content(), "6");
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod flow;
pub mod reactive;
pub mod render;

pub use config::{DocumentAttributes, HtmlDocumentOptions, RenderOptions};
pub use dom::{Document, Node};
pub use error::{Error, Result};
pub use flow::{error_boundary, for_each, lazy, match_case, show, suspense, switch, throw_error};
pub use reactive::{
    batch, on_mount, on_unmount, untrack, Cleanup, Computed, Effect, Ref, Signal, State,
};
pub use render::{
    create_element, h, is_valid_element, jsx_render, render, render_to_html_document,
    render_to_string, unmount, Element, ElementType, Props, PropsProxy, Value,
};

/// Build a [`Props`] map from `key => value` pairs.
///
/// Values go through `Value::from`, so anything convertible to a
/// [`Value`] can be used directly.
///
/// ```rust,ignore
/// let props = props! { "className" => "card", "hidden" => false };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::render::Props::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut props = $crate::render::Props::new();
        $(
            props.insert(
                ::std::string::String::from($key),
                $crate::render::Value::from($value),
            );
        )+
        props
    }};
}
