#![forbid(unsafe_code)]

//! Node storage and per-element style.

use std::fmt;
use std::str::FromStr;

use web_time::{Duration, Instant};

use crate::selector::Matchable;

/// Handle to a node in a [`Document`](super::Document).
///
/// Ids are never reused within a document, so a stale id simply refers to
/// a dead node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    /// Get the raw index value.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Display mode of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Block,
    None,
}

/// Errors from dimension parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid dimension {0:?}: expected `auto`, `<n>`, `<n>px`, or `<n>%`")]
pub struct DimensionError(pub String);

/// A CSS-like length.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    #[default]
    Auto,
    Px(u32),
    Percent(f32),
}

impl Dimension {
    /// Resolve against a reference length; `Auto` yields `None`.
    #[must_use]
    pub fn resolve(self, reference: u32) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Px(px) => Some(px),
            Self::Percent(pct) => Some((reference as f32 * pct / 100.0).round() as u32),
        }
    }
}

impl FromStr for Dimension {
    type Err = DimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || DimensionError(s.to_owned());
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if let Some(pct) = trimmed.strip_suffix('%') {
            let value: f32 = pct.trim().parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            return Ok(Self::Percent(value));
        }
        let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
        number.parse().map(Self::Px).map_err(|_| invalid())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Px(px) => write!(f, "{px}px"),
            Self::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// An in-flight fade-in animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeIn {
    pub started: Instant,
    pub duration: Duration,
}

impl FadeIn {
    /// Opacity in `[0.0, 1.0]` at `now`.
    #[must_use]
    pub fn opacity_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Whether the animation has run its course at `now`.
    #[must_use]
    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}

/// Presentational state of an element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub display: Display,
    pub width: Dimension,
    pub height: Dimension,
    pub top: i32,
    pub left: i32,
    pub z_index: Option<i32>,
    pub fade: Option<FadeIn>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element { tag: String },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) style: Style,
    pub(crate) alive: bool,
}

impl Node {
    pub(crate) fn element(tag: &str) -> Self {
        Self::with_kind(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        })
    }

    pub(crate) fn text(text: &str) -> Self {
        Self::with_kind(NodeKind::Text(text.to_owned()))
    }

    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
            style: Style::default(),
            alive: true,
        }
    }

    pub(crate) fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => value.clone_into(v),
            None => self.attrs.push((name.to_owned(), value.to_owned())),
        }
    }

    pub(crate) fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }

    pub(crate) fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }
}

impl Matchable for Node {
    fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}
