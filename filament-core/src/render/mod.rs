//! Rendering
//!
//! Values describe what to render: scalars, lists, declarative elements and
//! reactive handles. Two renderers consume them:
//!
//! - the client renderer builds nodes in the headless document and keeps
//!   them bound to their reactive sources;
//! - the server renderer serializes them to HTML text.
//!
//! Which one [`jsx_render`] uses is fixed per thread by [`render_mode`].

pub(crate) mod attr;
mod client;
mod element;
mod env;
mod props;
mod server;
mod value;

pub use attr::{escape_html, HTML_NS, MATHML_NS, SVG_NS};
pub use client::{render, render_to_node, unmount};
pub use element::{
    create_element, h, is_valid_element, AsyncComponent, Component, Element, ElementType,
};
pub use env::{current_error_handler, jsx_render, render_mode, RenderMode};
pub use props::{PropUpdate, Props, PropsProxy};
pub use server::{render_to_html_document, render_to_string};
pub use value::{Callback, Thunk, Value};

pub(crate) use client::render_with_cleanup;
pub(crate) use env::seal_client;
pub(crate) use value::ListKey;
