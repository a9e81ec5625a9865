//! Render configuration.
//!
//! [`RenderOptions`] is passed through a render; [`HtmlDocumentOptions`]
//! shapes the page produced by
//! [`render_to_html_document`](crate::render::render_to_html_document) and
//! can be loaded from JSON.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::error::Result;
use crate::reactive::ErrorHandler;
use crate::render::{Props, Value};

/// Options carried through a client render.
#[derive(Clone)]
pub struct RenderOptions {
    /// Collect effect cleanups onto the produced node.
    pub clean: bool,
    /// Receives failures of derived values created during the render.
    pub on_error: Option<ErrorHandler<Value>>,
    /// Namespace inherited by descendants (SVG, MathML).
    pub namespace: Option<&'static str>,
}

impl RenderOptions {
    pub fn with_error_handler(mut self, on_error: Option<ErrorHandler<Value>>) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn without_cleanup(mut self) -> Self {
        self.clean = false;
        self
    }

    pub(crate) fn within(&self, namespace: Option<&'static str>) -> Self {
        Self {
            namespace,
            ..self.clone()
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            clean: true,
            on_error: None,
            namespace: None,
        }
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("clean", &self.clean)
            .field("on_error", &self.on_error.is_some())
            .field("namespace", &self.namespace)
            .finish()
    }
}

fn default_doc_type() -> String {
    "<!DOCTYPE html>".to_string()
}

fn default_charset() -> Option<String> {
    Some("UTF-8".to_string())
}

fn default_viewport() -> Option<String> {
    Some("width=device-width, initial-scale=1.0".to_string())
}

/// A string, or `false`/`null` to omit the tag.
fn string_or_off<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Toggle {
        Text(String),
        Flag(bool),
        Off(()),
    }

    match Toggle::deserialize(deserializer)? {
        Toggle::Text(text) => Ok(Some(text)),
        Toggle::Flag(false) | Toggle::Off(()) => Ok(None),
        Toggle::Flag(true) => Err(serde::de::Error::custom(
            "expected a string, `false` or `null`",
        )),
    }
}

/// Attributes for the `<html>` and `<body>` tags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentAttributes {
    pub html: IndexMap<String, serde_json::Value>,
    pub body: IndexMap<String, serde_json::Value>,
}

impl DocumentAttributes {
    pub(crate) fn html_props(&self) -> Props {
        to_props(&self.html)
    }

    pub(crate) fn body_props(&self) -> Props {
        to_props(&self.body)
    }
}

fn to_props(entries: &IndexMap<String, serde_json::Value>) -> Props {
    entries
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value.clone())))
        .collect()
}

/// Shape of a full HTML page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlDocumentOptions {
    #[serde(default = "default_doc_type")]
    pub doc_type: String,

    #[serde(default = "default_charset", deserialize_with = "string_or_off")]
    pub charset: Option<String>,

    #[serde(default = "default_viewport", deserialize_with = "string_or_off")]
    pub viewport: Option<String>,

    #[serde(default)]
    pub attribute: DocumentAttributes,

    /// Rendered at the end of `<head>`.
    #[serde(skip)]
    pub head: Option<Value>,

    /// Rendered after the content inside `<body>`.
    #[serde(skip)]
    pub footer: Option<Value>,
}

impl HtmlDocumentOptions {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_head(mut self, head: impl Into<Value>) -> Self {
        self.head = Some(head.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<Value>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

impl Default for HtmlDocumentOptions {
    fn default() -> Self {
        Self {
            doc_type: default_doc_type(),
            charset: default_charset(),
            viewport: default_viewport(),
            attribute: DocumentAttributes::default(),
            head: None,
            footer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_standard_page() {
        let options = HtmlDocumentOptions::default();
        assert_eq!(options.doc_type, "<!DOCTYPE html>");
        assert_eq!(options.charset.as_deref(), Some("UTF-8"));
        assert_eq!(
            options.viewport.as_deref(),
            Some("width=device-width, initial-scale=1.0")
        );
    }

    #[test]
    fn empty_json_uses_defaults() {
        let options = HtmlDocumentOptions::from_json("{}").unwrap();
        assert_eq!(options.doc_type, "<!DOCTYPE html>");
        assert_eq!(options.charset.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn tags_can_be_switched_off() {
        let options =
            HtmlDocumentOptions::from_json(r#"{ "charset": false, "viewport": null }"#).unwrap();
        assert!(options.charset.is_none());
        assert!(options.viewport.is_none());
    }

    #[test]
    fn attributes_keep_declaration_order() {
        let options = HtmlDocumentOptions::from_json(
            r#"{ "docType": "<!doctype html>", "attribute": { "html": { "lang": "en", "dir": "ltr" } } }"#,
        )
        .unwrap();
        assert_eq!(options.doc_type, "<!doctype html>");
        let keys: Vec<_> = options.attribute.html.keys().cloned().collect();
        assert_eq!(keys, vec!["lang", "dir"]);
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let outcome = HtmlDocumentOptions::from_json(r#"{ "charset": true }"#);
        assert!(matches!(outcome, Err(crate::Error::Config(_))));
    }

    #[test]
    fn render_options_default_to_cleanup() {
        let options = RenderOptions::default();
        assert!(options.clean);
        assert!(!options.without_cleanup().clean);
    }
}
