//! Attribute naming and serialization rules shared by both renderers.

use std::sync::LazyLock;

use regex::Regex;

use super::{Props, Value};

pub(crate) const INNER_HTML: &str = "dangerouslySetInnerHTML";

pub const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

// Matched against the camelCase property name.
static UNITLESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)acit|ex(?:s|g|n|p|$)|rph|grid|ows|mnc|ntw|ine[ch]|zoo|^ord|itera")
        .expect("unitless pattern is valid")
});

static CAPTURE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(PointerCapture)$|Capture$").expect("capture pattern is valid")
});

/// Namespace entered by a tag, if it is not HTML.
pub(crate) fn namespace_for(tag: &str) -> Option<&'static str> {
    match tag {
        "svg" => Some(SVG_NS),
        "math" => Some(MATHML_NS),
        _ => None,
    }
}

pub(crate) fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Attributes that are never mirrored onto a node property.
pub(crate) fn is_non_update_attr(name: &str) -> bool {
    matches!(
        name,
        "style"
            | "width"
            | "height"
            | "href"
            | "list"
            | "form"
            | "tabindex"
            | "download"
            | "rowspan"
            | "colspan"
            | "role"
            | "popover"
    )
}

/// Props consumed by the renderer itself.
pub(crate) fn is_reserved_prop(name: &str) -> bool {
    matches!(name, "ref" | "key" | "children")
}

/// Attributes that also exist as a live property on the node.
pub(crate) fn reflects_property(name: &str) -> bool {
    matches!(
        name,
        "value"
            | "checked"
            | "selected"
            | "disabled"
            | "multiple"
            | "id"
            | "title"
            | "hidden"
            | "name"
            | "type"
            | "placeholder"
            | "lang"
            | "dir"
            | "src"
            | "alt"
    )
}

/// Map a prop name to its markup attribute name.
pub(crate) fn attr_name(key: &str) -> String {
    match key {
        "acceptCharset" => "accept-charset".to_string(),
        "httpEquiv" => "http-equiv".to_string(),
        "htmlFor" => "for".to_string(),
        "className" => "class".to_string(),
        _ => key.to_lowercase(),
    }
}

pub(crate) fn is_event(name: &str) -> bool {
    name.starts_with("on")
}

/// Split an `on*` prop into the DOM event name and its capture flag.
///
/// `onClickCapture` listens to `click` during capture; the pointer-capture
/// events keep their full name.
pub(crate) fn event_name(key: &str) -> (String, bool) {
    let stripped = CAPTURE_SUFFIX.replace(key, "$1");
    let capture = stripped.len() != key.len();
    let name = stripped.to_lowercase().get(2..).unwrap_or_default().to_string();
    (name, capture)
}

/// `fontSize` → `font-size`.
pub(crate) fn kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Serialize a record prop as `key:value;` pairs.
///
/// Numeric `style` values get a `px` suffix unless the property is unitless
/// or a custom property. Null and empty values are skipped.
pub(crate) fn obj_to_str(record: &Props, attr: &str) -> String {
    let mut out = String::new();
    for (key, value) in record {
        if value.is_null() || value.as_str() == Some("") {
            continue;
        }
        let name = kebab(key);
        let unit = attr == "style"
            && matches!(value, Value::Number(_))
            && !name.starts_with("--")
            && !UNITLESS.is_match(key);
        out.push_str(&name);
        out.push(':');
        out.push_str(&value.to_string());
        out.push_str(if unit { "px;" } else { ";" });
    }
    out
}

/// Escape `"`, `&`, `'`, `<` and `>`.
pub fn escape_html(input: &str) -> String {
    if !input.contains(['"', '&', '\'', '<', '>']) {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len() + 8);
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Integer parsing with the lenient rules of form controls: leading
/// whitespace and a sign are accepted, parsing stops at the first non-digit,
/// a `0x` prefix switches to hexadecimal and no digits at all yields NaN.
pub(crate) fn parse_int(input: &str) -> f64 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let mut value: Option<f64> = None;
    for ch in digits.chars() {
        let Some(digit) = ch.to_digit(radix) else {
            break;
        };
        value = Some(value.unwrap_or(0.0) * f64::from(radix) + f64::from(digit));
    }
    match value {
        Some(value) if negative => -value,
        Some(value) => value,
        None => f64::NAN,
    }
}
