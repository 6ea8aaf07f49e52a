//! Contentful Rich Text to HTML.
//!
//! A rich text field is a JSON tree of nodes. Each node type maps to one HTML
//! element; text nodes are escaped and wrapped in their marks. Node types we
//! do not know render their children only, so embedded entries degrade to
//! their text content instead of failing the page.

use askama::filters::{Escaper, Html};
use serde::Deserialize;

/// One node of a Rich Text document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextNode {
    pub node_type: String,
    #[serde(default)]
    pub content: Vec<RichTextNode>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub marks: Vec<Mark>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Inline formatting applied to a text node.
#[derive(Debug, Clone, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Render a rich text field value to HTML.
///
/// Anything that is not a rich text document renders as an empty string.
#[must_use]
pub fn render(value: &serde_json::Value) -> String {
    serde_json::from_value::<RichTextNode>(value.clone())
        .map(|node| render_node(&node))
        .unwrap_or_default()
}

/// Render a parsed node and its children to HTML.
#[must_use]
pub fn render_node(node: &RichTextNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_children(node: &RichTextNode, out: &mut String) {
    for child in &node.content {
        write_node(child, out);
    }
}

fn write_wrapped(tag: &str, node: &RichTextNode, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_children(node, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_node(node: &RichTextNode, out: &mut String) {
    match node.node_type.as_str() {
        "text" => write_text(node, out),
        "paragraph" => write_wrapped("p", node, out),
        "heading-1" => write_wrapped("h1", node, out),
        "heading-2" => write_wrapped("h2", node, out),
        "heading-3" => write_wrapped("h3", node, out),
        "heading-4" => write_wrapped("h4", node, out),
        "heading-5" => write_wrapped("h5", node, out),
        "heading-6" => write_wrapped("h6", node, out),
        "unordered-list" => write_wrapped("ul", node, out),
        "ordered-list" => write_wrapped("ol", node, out),
        "list-item" => write_wrapped("li", node, out),
        "blockquote" => write_wrapped("blockquote", node, out),
        "hr" => out.push_str("<hr>"),
        "hyperlink" => write_link(node, out),
        _ => write_children(node, out),
    }
}

fn write_text(node: &RichTextNode, out: &mut String) {
    let text = escape_html(node.value.as_deref().unwrap_or_default());
    let tags: Vec<&str> = node
        .marks
        .iter()
        .filter_map(|mark| match mark.kind.as_str() {
            "bold" => Some("strong"),
            "italic" => Some("em"),
            "underline" => Some("u"),
            "code" => Some("code"),
            _ => None,
        })
        .collect();

    for tag in &tags {
        out.push('<');
        out.push_str(tag);
        out.push('>');
    }
    out.push_str(&text);
    for tag in tags.iter().rev() {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn write_link(node: &RichTextNode, out: &mut String) {
    let uri = node
        .data
        .get("uri")
        .and_then(serde_json::Value::as_str)
        .filter(|uri| is_safe_uri(uri));

    let Some(uri) = uri else {
        write_children(node, out);
        return;
    };

    out.push_str("<a href=\"");
    out.push_str(&escape_html(uri));
    out.push('"');
    if uri.starts_with("http") {
        out.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
    }
    out.push('>');
    write_children(node, out);
    out.push_str("</a>");
}

fn is_safe_uri(uri: &str) -> bool {
    let lower = uri.trim().to_ascii_lowercase();
    lower.starts_with("https://")
        || lower.starts_with("http://")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || (lower.starts_with('/') && !lower.starts_with("//"))
}

/// Escape text for use in HTML content and double-quoted attributes, with
/// the same escaper the templates use.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = Html.write_escaped_str(&mut escaped, text);
    escaped
}

/// Plain text of a document, for meta descriptions.
#[must_use]
pub fn plain_text(node: &RichTextNode) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: &RichTextNode, out: &mut String) {
    if let Some(value) = &node.value {
        out.push_str(value);
    }
    for child in &node.content {
        collect_text(child, out);
        if child.node_type == "paragraph" {
            out.push(' ');
        }
    }
}
