//! Rich text normalization
//!
//! Text Editor values are stored either as an HTML string or as a delta
//! object (`{"ops": [{"insert": "..."}]}`). Both are normalized to HTML
//! before display.

use serde_json::Value as JsonValue;

/// HTML shown for an empty editor
pub const EMPTY_HTML: &str = "<p></p>";

/// Normalize a stored rich-text value to HTML
#[must_use]
pub fn to_html(value: &JsonValue) -> String {
    match value {
        JsonValue::String(html) if !html.trim().is_empty() => html.clone(),
        JsonValue::Object(map) => match map.get("ops") {
            Some(JsonValue::Array(ops)) => delta_to_html(ops),
            _ => EMPTY_HTML.to_string(),
        },
        JsonValue::Number(n) => paragraphs(&n.to_string()),
        _ => EMPTY_HTML.to_string(),
    }
}

/// Whether a stored rich-text value holds no text
#[must_use]
pub fn is_blank(value: &JsonValue) -> bool {
    let html = to_html(value);
    strip_tags(&html).trim().is_empty()
}

fn delta_to_html(ops: &[JsonValue]) -> String {
    // Embeds (images, formulas) carry object inserts and are skipped
    let text: String = ops
        .iter()
        .filter_map(|op| op.get("insert").and_then(JsonValue::as_str))
        .collect();
    paragraphs(&text)
}

fn paragraphs(text: &str) -> String {
    let html: String = text
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", escape(line)))
        .collect();
    if html.is_empty() {
        EMPTY_HTML.to_string()
    } else {
        html
    }
}

/// Escape text for inclusion in HTML
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Remove HTML tags, keeping text content
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            other if !in_tag => out.push(other),
            _ => {}
        }
    }
    out
}
