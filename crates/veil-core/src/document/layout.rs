#![forbid(unsafe_code)]

//! Block layout measurement.
//!
//! A deliberately small model: every element is a block that stacks its
//! displayed children vertically, and text is measured in fixed-size
//! character cells. Explicit `width`/`height` styles win over intrinsic
//! size; percentages resolve against the nearest definite ancestor size.
//!
//! # Invariants
//!
//! 1. A hidden element (`Display::None`) measures `0 x 0`.
//! 2. Whitespace-only text contributes nothing.
//! 3. Intrinsic width never exceeds the available width.

use unicode_width::UnicodeWidthStr;

use super::Tree;
use super::node::{Dimension, Display, NodeKind};
use crate::document::ElementId;
use crate::geometry::Size;

/// Height of one line of text, in pixels.
pub const LINE_HEIGHT: u32 = 20;

/// Width of one display column, in pixels.
pub const CHAR_WIDTH: u32 = 8;

impl Tree {
    /// Definite height of `id` if its style or ancestry fixes one.
    pub(crate) fn definite_height(&self, id: ElementId) -> Option<u32> {
        if id == self.body {
            return Some(self.viewport.height);
        }
        let node = self.node(id)?;
        match node.style.height {
            Dimension::Px(px) => Some(px),
            Dimension::Percent(_) => {
                let parent = node.parent.and_then(|p| self.definite_height(p))?;
                node.style.height.resolve(parent)
            }
            Dimension::Auto => None,
        }
    }

    /// Definite width of the containing block of `id`.
    fn containing_width(&self, id: ElementId) -> u32 {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return self.viewport.width;
        };
        if parent == self.body {
            return self.viewport.width;
        }
        let outer = self.containing_width(parent);
        self.node(parent)
            .and_then(|n| n.style.width.resolve(outer))
            .unwrap_or(outer)
    }

    pub(crate) fn measure(&self, id: ElementId) -> Size {
        let available = self.containing_width(id);
        let parent_height = self
            .node(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.definite_height(p));
        self.measure_in(id, available, parent_height)
    }

    fn measure_in(&self, id: ElementId, available: u32, parent_height: Option<u32>) -> Size {
        let Some(node) = self.node(id) else {
            return Size::default();
        };
        match &node.kind {
            NodeKind::Text(text) => measure_text(text, available),
            NodeKind::Element { .. } => {
                if node.style.display == Display::None {
                    return Size::default();
                }
                let width = node.style.width.resolve(available);
                let height = match node.style.height {
                    Dimension::Px(px) => Some(px),
                    Dimension::Percent(_) => {
                        parent_height.and_then(|h| node.style.height.resolve(h))
                    }
                    Dimension::Auto => None,
                };
                let inner_width = width.unwrap_or(available);
                let mut content = Size::default();
                for &child in &node.children {
                    let size = self.measure_in(child, inner_width, height);
                    content.width = content.width.max(size.width);
                    content.height = content.height.saturating_add(size.height);
                }
                Size::new(
                    width.unwrap_or_else(|| content.width.min(available)),
                    height.unwrap_or(content.height),
                )
            }
        }
    }
}

fn measure_text(text: &str, available: u32) -> Size {
    if text.trim().is_empty() {
        return Size::default();
    }
    let mut lines = 0u32;
    let mut widest = 0u32;
    for line in text.lines() {
        lines += 1;
        let columns = u32::try_from(line.width()).unwrap_or(u32::MAX);
        widest = widest.max(columns.saturating_mul(CHAR_WIDTH));
    }
    Size::new(widest.min(available), lines.saturating_mul(LINE_HEIGHT))
}
