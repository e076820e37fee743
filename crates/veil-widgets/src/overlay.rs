#![forbid(unsafe_code)]

//! Positioned overlay capability.
//!
//! An [`Overlay`] owns one root element in a [`Document`] and the state every
//! floating widget shares: visibility, size, stacking order, and alignment
//! against the viewport. Widgets compose an `Overlay` rather than extend one.
//!
//! # Alignment
//!
//! An [`Align`] pins an anchor point on the element (`self_xy`) to an anchor
//! point on the viewport (`base_xy`). Anchors are [`Dimension`]s resolved
//! against the element size and the viewport size respectively, so
//! `50% 50%` onto `50% 50%` centres the element.
//!
//! # Invariants
//!
//! 1. [`Overlay::effective_align`] is derived on every call and never cached.
//! 2. Every [`Overlay::set_position`] call counts as one positioning pass.
//! 3. Only an explicit height counts as a height application.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use veil_core::{Dimension, Document, ElementId, Point};

/// Global counter for overlay ids.
static OVERLAY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Fraction of the viewport height above which an overlay is pinned to the
/// top instead of being centred.
pub const TALL_OVERLAY_RATIO: f64 = 0.84;

/// Unique identifier of an overlay (its `cid`).
///
/// Rendered as `overlay-N`; the rendered form doubles as the event namespace
/// for listeners the overlay owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

impl OverlayId {
    /// Allocate a fresh id.
    pub(crate) fn next() -> Self {
        Self(OVERLAY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay-{}", self.0)
    }
}

/// A point on a box, as horizontal and vertical offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: Dimension,
    pub y: Dimension,
}

impl Anchor {
    /// Top-left corner.
    pub const ORIGIN: Self = Self::new(Dimension::Px(0), Dimension::Px(0));

    /// Centre of the box.
    pub const CENTER: Self = Self::new(Dimension::Percent(50.0), Dimension::Percent(50.0));

    #[must_use]
    pub const fn new(x: Dimension, y: Dimension) -> Self {
        Self { x, y }
    }

    fn resolve(self, size: veil_core::Size) -> Point {
        let axis = |d: Dimension, len: u32| {
            d.resolve(len)
                .map_or(0, |v| i32::try_from(v).unwrap_or(i32::MAX))
        };
        Point::new(axis(self.x, size.width), axis(self.y, size.height))
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Alignment of an overlay against the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Align {
    /// Anchor on the overlay element.
    pub self_xy: Anchor,
    /// Anchor on the viewport.
    pub base_xy: Anchor,
}

impl Align {
    /// Centre on both axes.
    pub const CENTERED: Self = Self {
        self_xy: Anchor::CENTER,
        base_xy: Anchor::CENTER,
    };

    /// Horizontally centred with the top edge 70px below the viewport top.
    pub const PINNED_TOP: Self = Self {
        self_xy: Anchor::new(Dimension::Percent(50.0), Dimension::Px(0)),
        base_xy: Anchor::new(Dimension::Percent(50.0), Dimension::Px(70)),
    };

    #[must_use]
    pub const fn new(self_xy: Anchor, base_xy: Anchor) -> Self {
        Self { self_xy, base_xy }
    }
}

/// Counters for layout work performed on an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutStats {
    /// Number of positioning passes.
    pub position_passes: u32,
    /// Number of times an explicit height was written to the element.
    pub height_applications: u32,
}

/// Shared state and positioning for a floating element.
#[derive(Debug, Clone)]
pub struct Overlay {
    id: OverlayId,
    document: Document,
    element: ElementId,
    visible: bool,
    width: Dimension,
    height: Option<Dimension>,
    z_index: i32,
    align: Align,
    stats: LayoutStats,
}

impl Overlay {
    /// Wrap `element` of `document`. The overlay starts hidden.
    #[must_use]
    pub fn new(document: &Document, element: ElementId) -> Self {
        Self {
            id: OverlayId::next(),
            document: document.clone(),
            element,
            visible: false,
            width: Dimension::Auto,
            height: None,
            z_index: 0,
            align: Align::CENTERED,
            stats: LayoutStats::default(),
        }
    }

    /// The overlay's id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> OverlayId {
        self.id
    }

    /// The root element.
    #[inline]
    #[must_use]
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// The document the element lives in.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Attach the element to the body unless it is already connected.
    pub fn attach(&self) {
        if !self.document.is_connected(self.element) {
            self.document
                .append_child(self.document.body(), self.element);
        }
    }

    // --- Visibility ---

    /// Logical visibility.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Record visibility without touching the element.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Mark visible and display the element immediately.
    pub fn show(&mut self) {
        self.visible = true;
        self.document.show(self.element);
    }

    /// Mark hidden and hide the element immediately.
    pub fn hide(&mut self) {
        self.visible = false;
        self.document.hide(self.element);
    }

    // --- Size & stacking ---

    #[must_use]
    pub fn width(&self) -> Dimension {
        self.width
    }

    /// Set and apply the width.
    pub fn set_width(&mut self, width: Dimension) {
        self.width = width;
        self.document.update_style(self.element, |s| s.width = width);
    }

    #[must_use]
    pub fn height(&self) -> Option<Dimension> {
        self.height
    }

    /// Set the height and apply it.
    pub fn set_height(&mut self, height: Option<Dimension>) {
        self.height = height;
        self.apply_height();
    }

    /// Write the configured height to the element. `None` restores the
    /// intrinsic height and is not counted.
    pub fn apply_height(&mut self) {
        let height = self.height;
        self.document
            .update_style(self.element, |s| s.height = height.unwrap_or_default());
        if height.is_some() {
            self.stats.height_applications += 1;
        }
    }

    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Set and apply the stacking order.
    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
        self.document
            .update_style(self.element, |s| s.z_index = Some(z_index));
    }

    // --- Alignment ---

    /// The configured alignment.
    #[must_use]
    pub fn align(&self) -> Align {
        self.align
    }

    pub fn set_align(&mut self, align: Align) {
        self.align = align;
    }

    /// Alignment to use right now: [`Align::PINNED_TOP`] when the element is
    /// taller than [`TALL_OVERLAY_RATIO`] of the viewport, the configured
    /// alignment otherwise.
    #[must_use]
    pub fn effective_align(&self) -> Align {
        let height = f64::from(self.document.measure(self.element).height);
        let limit = f64::from(self.document.viewport().height) * TALL_OVERLAY_RATIO;
        if height > limit {
            Align::PINNED_TOP
        } else {
            self.align
        }
    }

    /// Run a positioning pass. Returns the new top-left corner.
    pub fn set_position(&mut self) -> Point {
        let align = self.effective_align();
        let size = self.document.measure(self.element);
        let base = align.base_xy.resolve(self.document.viewport());
        let own = align.self_xy.resolve(size);
        let origin = Point::new(base.x - own.x, base.y - own.y);
        self.document.update_style(self.element, |s| {
            s.left = origin.x;
            s.top = origin.y;
        });
        self.stats.position_passes += 1;
        tracing::trace!(
            overlay = %self.id,
            top = origin.y,
            left = origin.x,
            height = size.height,
            "positioned"
        );
        origin
    }

    /// Layout counters accumulated so far.
    #[must_use]
    pub fn layout_stats(&self) -> LayoutStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use veil_core::Size;

    use super::*;

    fn overlay_with_height(height: u32) -> (Document, Overlay) {
        let doc = Document::new(Size::new(1000, 500));
        let el = doc.create_element("div");
        let mut overlay = Overlay::new(&doc, el);
        overlay.attach();
        overlay.set_width(Dimension::Px(200));
        overlay.set_height(Some(Dimension::Px(height)));
        overlay.show();
        (doc, overlay)
    }

    #[test]
    fn ids_are_unique_and_namespaced() {
        let a = OverlayId::next();
        let b = OverlayId::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("overlay-"));
    }

    #[test]
    fn centred_by_default() {
        let (doc, mut overlay) = overlay_with_height(100);
        let origin = overlay.set_position();
        assert_eq!(origin, Point::new(400, 200));
        assert_eq!(doc.style(overlay.element()).top, 200);
        assert_eq!(overlay.layout_stats().position_passes, 1);
    }

    #[test]
    fn tall_overlays_pin_to_top() {
        // 84% of 500 is 420.
        let (_doc, mut overlay) = overlay_with_height(420);
        assert_eq!(overlay.effective_align(), Align::CENTERED);

        overlay.set_height(Some(Dimension::Px(421)));
        assert_eq!(overlay.effective_align(), Align::PINNED_TOP);
        assert_eq!(overlay.set_position(), Point::new(400, 70));
    }

    #[test]
    fn effective_align_tracks_live_height() {
        let (_doc, mut overlay) = overlay_with_height(450);
        assert_eq!(overlay.effective_align(), Align::PINNED_TOP);
        overlay.set_height(Some(Dimension::Px(100)));
        assert_eq!(overlay.effective_align(), Align::CENTERED);
    }

    #[test]
    fn only_explicit_heights_are_counted() {
        let (_doc, mut overlay) = overlay_with_height(100);
        assert_eq!(overlay.layout_stats().height_applications, 1);
        overlay.set_height(None);
        overlay.apply_height();
        assert_eq!(overlay.layout_stats().height_applications, 1);
    }

    #[test]
    fn hidden_overlay_hides_element() {
        let (doc, mut overlay) = overlay_with_height(10);
        assert!(doc.is_visible(overlay.element()));
        overlay.hide();
        assert!(!overlay.is_visible());
        assert!(!doc.is_visible(overlay.element()));
    }
}
