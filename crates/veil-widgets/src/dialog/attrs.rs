#![forbid(unsafe_code)]

//! Dialog attribute values.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use veil_core::{Dimension, ElementId, Selector};

use super::Dialog;
use super::content;
use crate::overlay::Align;

/// Source of the dialog body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Empty,
    /// Markup, literal text, or a remote URL.
    Markup(String),
    /// An existing element, moved into the content region.
    Element(ElementId),
}

impl Content {
    /// Whether this content is fetched from a URL.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        match self {
            Self::Markup(value) => content::is_remote_url(value),
            Self::Empty | Self::Element(_) => false,
        }
    }

    /// The raw string value, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Markup(value) => Some(value),
            Self::Empty | Self::Element(_) => None,
        }
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::Markup(value.to_owned())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::Markup(value)
    }
}

impl From<ElementId> for Content {
    fn from(element: ElementId) -> Self {
        Self::Element(element)
    }
}

/// Elements whose click opens the dialog.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Trigger {
    #[default]
    None,
    Elements(Vec<ElementId>),
    /// Every connected element matching the selector when it is resolved.
    Selector(Selector),
}

impl From<ElementId> for Trigger {
    fn from(element: ElementId) -> Self {
        Self::Elements(vec![element])
    }
}

impl From<Vec<ElementId>> for Trigger {
    fn from(elements: Vec<ElementId>) -> Self {
        Self::Elements(elements)
    }
}

impl From<Selector> for Trigger {
    fn from(selector: Selector) -> Self {
        Self::Selector(selector)
    }
}

/// Custom show animation. Receives the dialog and its root element and is
/// responsible for displaying the element.
pub type EffectFn = Rc<dyn Fn(&Dialog, ElementId)>;

/// How the dialog appears. Hiding is always immediate.
#[derive(Clone, Default)]
pub enum Effect {
    #[default]
    None,
    /// Fade in over [`FADE_DURATION`](super::FADE_DURATION).
    Fade,
    Custom(EffectFn),
}

impl Effect {
    /// Wrap a custom effect callback.
    pub fn custom(f: impl Fn(&Dialog, ElementId) + 'static) -> Self {
        Self::Custom(Rc::new(f))
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Fade => f.write_str("Fade"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) | (Self::Fade, Self::Fade) => true,
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Error for an effect name other than `none` or `fade`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown effect {0:?}: expected `none` or `fade`")]
pub struct UnknownEffect(pub String);

impl FromStr for Effect {
    type Err = UnknownEffect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" | "" => Ok(Self::None),
            "fade" => Ok(Self::Fade),
            other => Err(UnknownEffect(other.to_owned())),
        }
    }
}

/// A dialog attribute with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    Content(Content),
    Trigger(Trigger),
    ClassPrefix(String),
    HasMask(bool),
    HideOnClickMask(bool),
    HideOnKeyEscape(bool),
    CloseTpl(String),
    Width(Dimension),
    Height(Option<Dimension>),
    Effect(Effect),
    ZIndex(i32),
    Align(Align),
    Visible(bool),
}

impl Attr {
    #[must_use]
    pub fn key(&self) -> AttrKey {
        match self {
            Self::Content(_) => AttrKey::Content,
            Self::Trigger(_) => AttrKey::Trigger,
            Self::ClassPrefix(_) => AttrKey::ClassPrefix,
            Self::HasMask(_) => AttrKey::HasMask,
            Self::HideOnClickMask(_) => AttrKey::HideOnClickMask,
            Self::HideOnKeyEscape(_) => AttrKey::HideOnKeyEscape,
            Self::CloseTpl(_) => AttrKey::CloseTpl,
            Self::Width(_) => AttrKey::Width,
            Self::Height(_) => AttrKey::Height,
            Self::Effect(_) => AttrKey::Effect,
            Self::ZIndex(_) => AttrKey::ZIndex,
            Self::Align(_) => AttrKey::Align,
            Self::Visible(_) => AttrKey::Visible,
        }
    }
}

/// Attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKey {
    Content,
    Trigger,
    ClassPrefix,
    HasMask,
    HideOnClickMask,
    HideOnKeyEscape,
    CloseTpl,
    Width,
    Height,
    Effect,
    ZIndex,
    Align,
    Visible,
}

impl AttrKey {
    pub const ALL: [Self; 13] = [
        Self::Content,
        Self::Trigger,
        Self::ClassPrefix,
        Self::HasMask,
        Self::HideOnClickMask,
        Self::HideOnKeyEscape,
        Self::CloseTpl,
        Self::Width,
        Self::Height,
        Self::Effect,
        Self::ZIndex,
        Self::Align,
        Self::Visible,
    ];

    /// The camel-case attribute name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Trigger => "trigger",
            Self::ClassPrefix => "classPrefix",
            Self::HasMask => "hasMask",
            Self::HideOnClickMask => "hideOnClickMask",
            Self::HideOnKeyEscape => "hideOnKeyEscape",
            Self::CloseTpl => "closeTpl",
            Self::Width => "width",
            Self::Height => "height",
            Self::Effect => "effect",
            Self::ZIndex => "zIndex",
            Self::Align => "align",
            Self::Visible => "visible",
        }
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised attribute name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialog attribute {0:?}")]
pub struct UnknownAttr(pub String);

impl FromStr for AttrKey {
    type Err = UnknownAttr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownAttr(s.to_owned()))
    }
}
