#![forbid(unsafe_code)]

//! Markup fragment parsing.
//!
//! Converts an HTML snippet into an owned [`MarkupNode`] tree that the
//! [`Document`](crate::Document) can materialise. Parsing is delegated to
//! the HTML5 fragment parser in `scraper`, which never fails outright.
//!
//! Two entry points:
//!
//! - [`parse_fragment`] accepts only *structured* fragments: values that
//!   start with `<` and produce at least one top-level element.
//! - [`parse_markup`] accepts anything the parser can make nodes from,
//!   including leading text and character references.
//!
//! # Failure Modes
//!
//! | Input | `parse_fragment` | `parse_markup` |
//! |-------|------------------|----------------|
//! | `"plain text"` | `None` | one text node |
//! | `"Hello <b>world</b>"` | `None` | text, then `b` |
//! | `"<p>a</p><p>b</p>"` | two elements | two elements |
//! | `"&times;"` | `None` | text `×` |
//! | `""` | `None` | no nodes |

use scraper::{ElementRef, Html, Node};

/// An owned markup node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
    Text(String),
}

impl MarkupNode {
    /// Build an element node.
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Whether this is an element.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }
}

/// Parse `input` as a structured fragment.
///
/// Returns `None` when `input` is not markup.
#[must_use]
pub fn parse_fragment(input: &str) -> Option<Vec<MarkupNode>> {
    let trimmed = input.trim();
    if !trimmed.starts_with('<') {
        return None;
    }
    let html = Html::parse_fragment(trimmed);
    let nodes = convert_children(html.root_element());
    nodes.iter().any(MarkupNode::is_element).then_some(nodes)
}

/// Parse `input` as markup, leading text included.
///
/// Empty or whitespace-only input yields no nodes.
#[must_use]
pub fn parse_markup(input: &str) -> Vec<MarkupNode> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    let html = Html::parse_fragment(input);
    convert_children(html.root_element())
}

fn convert_children(parent: ElementRef<'_>) -> Vec<MarkupNode> {
    let mut out = Vec::new();
    for child in parent.children() {
        if let Some(element) = ElementRef::wrap(child) {
            let value = element.value();
            out.push(MarkupNode::Element {
                tag: value.name().to_owned(),
                attrs: value
                    .attrs()
                    .map(|(name, val)| (name.to_owned(), val.to_owned()))
                    .collect(),
                children: convert_children(element),
            });
        } else if let Node::Text(text) = child.value() {
            out.push(MarkupNode::Text(String::from(&**text)));
        }
    }
    out
}

/// Serialise nodes back to markup.
#[must_use]
pub fn serialize(nodes: &[MarkupNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &MarkupNode) {
    match node {
        MarkupNode::Text(text) => escape_into(out, text, false),
        MarkupNode::Element {
            tag,
            attrs,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(out, value, true);
                out.push('"');
            }
            out.push('>');
            for child in children {
                write_node(out, child);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

/// Escape text for inclusion in markup.
pub fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
