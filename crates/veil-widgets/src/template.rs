#![forbid(unsafe_code)]

//! Dialog skeleton templates.
//!
//! A [`Template`] materialises the detached root element of a dialog. The
//! dialog then looks for two marked descendants:
//!
//! | Marker | Role |
//! |--------|------|
//! | `[data-role=content]` | content region (a `{prefix}-content` child is appended when missing) |
//! | `[data-role=close]` | close control (optional) |
//!
//! Class names derive from the class prefix, e.g. `ui-dialog`,
//! `ui-dialog-close`, `ui-dialog-content`.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use veil_core::markup::{self, MarkupNode};
use veil_core::{Document, ElementId};

/// The only placeholder templates may use.
pub const CLASS_PREFIX_PLACEHOLDER: &str = "classPrefix";

static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}")
        .map_err(|err| tracing::error!(%err, "template placeholder pattern failed to compile"))
        .ok()
});

/// Errors from [`MarkupTemplate::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown template placeholder {{{{{name}}}}}")]
    UnknownPlaceholder { name: String },
    #[error("template has an unclosed placeholder at byte {offset}")]
    Unclosed { offset: usize },
    #[error("template must contain exactly one root element, found {found}")]
    RootCount { found: usize },
}

/// Builds the root element of a dialog.
pub trait Template: fmt::Debug {
    /// Create the detached root element for `class_prefix`.
    fn materialize(&self, document: &Document, class_prefix: &str) -> ElementId;
}

/// The built-in skeleton:
///
/// ```text
/// <div class="{prefix}">
///   <a class="{prefix}-close" title="Close" href="javascript:;" data-role="close"></a>
///   <div class="{prefix}-content" data-role="content"></div>
/// </div>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogTemplate;

impl Template for DialogTemplate {
    fn materialize(&self, document: &Document, class_prefix: &str) -> ElementId {
        let root = document.create_element("div");
        document.add_class(root, class_prefix);

        let close = document.create_element("a");
        document.add_class(close, &format!("{class_prefix}-close"));
        document.set_attr(close, "title", "Close");
        document.set_attr(close, "href", "javascript:;");
        document.set_attr(close, "data-role", "close");
        document.append_child(root, close);

        let content = document.create_element("div");
        document.add_class(content, &format!("{class_prefix}-content"));
        document.set_attr(content, "data-role", "content");
        document.append_child(root, content);
        root
    }
}

/// A template written as markup with `{{classPrefix}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupTemplate {
    source: String,
}

impl MarkupTemplate {
    /// Validate `source`: only `{{classPrefix}}` placeholders, and exactly
    /// one root element once expanded.
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        if let Some(re) = PLACEHOLDER.as_ref() {
            for caps in re.captures_iter(&source) {
                let name = &caps[1];
                if name != CLASS_PREFIX_PLACEHOLDER {
                    return Err(TemplateError::UnknownPlaceholder {
                        name: name.to_owned(),
                    });
                }
            }
        }
        let template = Self { source };
        let expanded = template.expand("ui-dialog");
        if let Some(offset) = expanded.find("{{") {
            return Err(TemplateError::Unclosed { offset });
        }
        let found = markup::parse_fragment(&expanded)
            .map_or(0, |nodes| nodes.iter().filter(|n| n.is_element()).count());
        if found != 1 {
            return Err(TemplateError::RootCount { found });
        }
        Ok(template)
    }

    /// The template source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    fn expand(&self, class_prefix: &str) -> String {
        match PLACEHOLDER.as_ref() {
            Some(re) => re
                .replace_all(&self.source, |_: &Captures<'_>| class_prefix.to_owned())
                .into_owned(),
            None => self.source.replace("{{classPrefix}}", class_prefix),
        }
    }
}

impl Template for MarkupTemplate {
    fn materialize(&self, document: &Document, class_prefix: &str) -> ElementId {
        let nodes = markup::parse_fragment(&self.expand(class_prefix)).unwrap_or_default();
        let root: Vec<MarkupNode> = nodes.into_iter().filter(MarkupNode::is_element).collect();
        document
            .create_markup(&root)
            .into_iter()
            .next()
            .unwrap_or_else(|| document.create_element("div"))
    }
}

#[cfg(test)]
mod tests {
    use veil_core::{Selector, Size};

    use super::*;

    fn doc() -> Document {
        Document::new(Size::new(800, 600))
    }

    #[test]
    fn placeholder_pattern_compiles() {
        assert!(PLACEHOLDER.is_some());
        assert_eq!(
            MarkupTemplate::parse("<i class=\"{{ nope }}\"></i>"),
            Err(TemplateError::UnknownPlaceholder { name: "nope".into() })
        );
    }

    #[test]
    fn default_skeleton_has_roles_and_classes() {
        let doc = doc();
        let root = DialogTemplate.materialize(&doc, "ui-dialog");
        assert!(doc.has_class(root, "ui-dialog"));
        let close = doc
            .find(root, &Selector::parse("a.ui-dialog-close[data-role=close]").unwrap())
            .unwrap();
        let content = doc
            .find(root, &Selector::parse("[data-role=content]").unwrap())
            .unwrap();
        assert!(doc.has_class(content, "ui-dialog-content"));
        assert_eq!(doc.children(root), vec![close, content]);
        assert_eq!(doc.parent(root), None);
    }

    #[test]
    fn markup_template_expands_prefix() {
        let template = MarkupTemplate::parse(
            r#"<section class="{{classPrefix}}"><div class="{{ classPrefix }}-body" data-role="content"></div></section>"#,
        )
        .unwrap();
        let doc = doc();
        let root = template.materialize(&doc, "box");
        assert_eq!(doc.tag_name(root).as_deref(), Some("section"));
        assert!(doc.has_class(root, "box"));
        let body = doc.element_children(root)[0];
        assert!(doc.has_class(body, "box-body"));
    }

    #[test]
    fn unknown_placeholders_are_rejected() {
        assert_eq!(
            MarkupTemplate::parse("<div class=\"{{title}}\"></div>"),
            Err(TemplateError::UnknownPlaceholder {
                name: "title".into()
            })
        );
    }

    #[test]
    fn unclosed_placeholder_is_rejected() {
        assert!(matches!(
            MarkupTemplate::parse("<div class=\"{{classPrefix\"></div>"),
            Err(TemplateError::Unclosed { .. })
        ));
    }

    #[test]
    fn exactly_one_root() {
        assert_eq!(
            MarkupTemplate::parse("<p></p><p></p>"),
            Err(TemplateError::RootCount { found: 2 })
        );
        assert_eq!(
            MarkupTemplate::parse("just text"),
            Err(TemplateError::RootCount { found: 0 })
        );
    }
}
