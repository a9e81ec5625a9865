//! Server Renderer
//!
//! Serializes values to HTML text. Reactive values are read once; no
//! bindings outlive the call.

use super::attr::{attr_name, escape_html, is_reserved_prop, is_void_element, obj_to_str, INNER_HTML};
use super::client::inner_html;
use super::{Element, ElementType, Props, PropsProxy, Value};
use crate::config::HtmlDocumentOptions;
use crate::error::{Error, Result};

/// Serialize a value to markup.
///
/// Text is escaped. [`Value::Markup`] is emitted verbatim.
pub fn render_to_string(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null | Value::Bool(_) | Value::Handler(_) => {}
        Value::Thunk(_) | Value::Derived(_) | Value::Cell(_) => {
            write_value(out, &value.current()?)?;
        }
        Value::Callback(callback) => write_value(out, &callback(&[])?)?,
        Value::Number(_) | Value::Text(_) => out.push_str(&escape_html(&value.to_string())),
        Value::Markup(html) => out.push_str(html),
        Value::List(items) => {
            for item in items.iter() {
                write_value(out, item)?;
            }
        }
        Value::Element(element) => write_element(out, element)?,
        Value::Node(node) => out.push_str(&node.outer_html()),
        Value::Record(_) | Value::Ref(_) => out.push_str(&escape_html(&value.to_string())),
    }
    Ok(())
}

fn write_element(out: &mut String, element: &Element) -> Result<()> {
    let tag = match &element.kind {
        ElementType::Component(component) => {
            let output = component(PropsProxy::new(element.props.clone()))?;
            return write_value(out, &output);
        }
        ElementType::Fragment => {
            return match element.children() {
                Some(children) => write_value(out, children),
                None => Ok(()),
            };
        }
        ElementType::Async(_) => return Err(Error::UnresolvedAsync),
        ElementType::Tag(tag) => tag,
    };

    out.push('<');
    out.push_str(tag);
    out.push_str(&to_attr(&element.props)?);
    out.push('>');
    if is_void_element(tag) {
        return Ok(());
    }

    match element.props.get(INNER_HTML).and_then(inner_html) {
        Some(html) => out.push_str(&html),
        None => {
            if let Some(children) = element.children() {
                write_value(out, children)?;
            }
        }
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
    Ok(())
}

/// Serialize props as ` name="value"` pairs.
fn to_attr(props: &Props) -> Result<String> {
    let mut attr = String::new();
    for (key, value) in props {
        if is_reserved_prop(key) || key == INNER_HTML {
            continue;
        }
        let value = match value {
            Value::Thunk(_) | Value::Derived(_) | Value::Cell(_) => value.current()?,
            other => other.clone(),
        };
        if matches!(
            value,
            Value::Null | Value::Bool(false) | Value::Handler(_) | Value::Callback(_)
        ) {
            continue;
        }

        let name = attr_name(key);
        let name = name.strip_prefix("bind:").unwrap_or(&name);
        attr.push(' ');
        attr.push_str(name);
        match &value {
            Value::Bool(true) => {}
            Value::Record(record) => {
                attr.push_str("=\"");
                attr.push_str(&escape_html(&obj_to_str(record, name)));
                attr.push('"');
            }
            other => {
                attr.push_str("=\"");
                attr.push_str(&escape_html(&other.to_string()));
                attr.push('"');
            }
        }
    }
    Ok(attr)
}

/// Render a complete page around `value`.
///
/// ```rust,ignore
/// let page = render_to_html_document(&app, &HtmlDocumentOptions::default())?;
/// assert!(page.starts_with("<!DOCTYPE html><html><head><meta charset=\"UTF-8\">"));
/// ```
pub fn render_to_html_document(value: &Value, options: &HtmlDocumentOptions) -> Result<String> {
    let mut page = String::new();
    page.push_str(&options.doc_type);
    page.push_str("<html");
    page.push_str(&to_attr(&options.attribute.html_props())?);
    page.push_str("><head>");
    if let Some(charset) = &options.charset {
        page.push_str(&format!("<meta charset=\"{}\">", escape_html(charset)));
    }
    if let Some(viewport) = &options.viewport {
        page.push_str(&format!(
            "<meta name=\"viewport\" content=\"{}\">",
            escape_html(viewport)
        ));
    }
    if let Some(head) = &options.head {
        write_value(&mut page, head)?;
    }
    page.push_str("</head><body");
    page.push_str(&to_attr(&options.attribute.body_props())?);
    page.push('>');
    write_value(&mut page, value)?;
    if let Some(footer) = &options.footer {
        write_value(&mut page, footer)?;
    }
    page.push_str("</body></html>");
    Ok(page)
}
