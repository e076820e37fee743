#![forbid(unsafe_code)]

//! Shared backdrop mask.
//!
//! One [`Mask`] exists per [`Page`](crate::Page). Every masked overlay that
//! becomes visible registers itself; the mask keeps a [`MaskStack`] of them
//! and always sits directly beneath the most recently shown one.
//!
//! # Invariants
//!
//! 1. The mask is visible iff the stack is non-empty.
//! 2. While the stack is non-empty the mask element is the previous sibling
//!    of the top overlay's element and carries that overlay's z-index.
//! 3. Registering twice never duplicates an entry; releasing an absent
//!    overlay is a no-op.
//! 4. Releasing a buried overlay leaves the mask where it is.
//!
//! # Example
//!
//! ```ignore
//! let mask = page.mask();
//! mask.register(&dialog_a);   // stack [a], mask under a
//! mask.register(&dialog_b);   // stack [a, b], mask under b
//! mask.release(b_id);         // stack [a], mask moves under a
//! mask.release(a_id);         // stack [], mask hidden
//! ```

mod stack;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use veil_core::{Dimension, Document, ElementId, Target};

use crate::overlay::{Overlay, OverlayId};

pub use stack::{MaskStack, Masked, Push, Release};

/// Class carried by the mask element.
pub const MASK_CLASS: &str = "ui-mask";

struct MaskInner {
    overlay: RefCell<Overlay>,
    stack: RefCell<MaskStack>,
}

/// Shared handle to the page mask.
#[derive(Clone)]
pub struct Mask {
    inner: Rc<MaskInner>,
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mask")
            .field("element", &self.element())
            .field("visible", &self.is_visible())
            .field("stack", &*self.inner.stack.borrow())
            .finish()
    }
}

impl PartialEq for Mask {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Mask {
    /// Create the mask element in `document`, attached and hidden.
    #[must_use]
    pub fn new(document: &Document) -> Self {
        let element = document.create_element("div");
        document.add_class(element, MASK_CLASS);
        let mut overlay = Overlay::new(document, element);
        overlay.set_width(Dimension::Percent(100.0));
        overlay.set_height(Some(Dimension::Percent(100.0)));
        overlay.attach();
        overlay.hide();
        tracing::debug!(element = %element, "mask created");
        Self {
            inner: Rc::new(MaskInner {
                overlay: RefCell::new(overlay),
                stack: RefCell::new(MaskStack::new()),
            }),
        }
    }

    /// The mask element.
    #[must_use]
    pub fn element(&self) -> ElementId {
        self.inner.overlay.borrow().element()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.inner.overlay.borrow().is_visible()
    }

    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.inner.overlay.borrow().z_index()
    }

    /// Number of overlays on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.stack.borrow().len()
    }

    /// Stacked overlay ids, bottom to top.
    #[must_use]
    pub fn stack(&self) -> Vec<OverlayId> {
        self.inner.stack.borrow().ids()
    }

    #[must_use]
    pub fn top(&self) -> Option<OverlayId> {
        self.inner.stack.borrow().top_id()
    }

    #[must_use]
    pub fn contains(&self, id: OverlayId) -> bool {
        self.inner.stack.borrow().contains(id)
    }

    /// Put `overlay` on top of the stack and move the mask beneath it.
    pub fn register(&self, overlay: &Rc<dyn Masked>) -> Push {
        let outcome = self.inner.stack.borrow_mut().push(overlay);
        self.place_beneath(overlay.as_ref());
        tracing::debug!(
            overlay = %overlay.overlay_id(),
            ?outcome,
            depth = self.depth(),
            "mask registered"
        );
        outcome
    }

    /// Take `id` off the stack and drop its click handler.
    ///
    /// Releasing the top overlay moves the mask beneath the new top;
    /// releasing a buried one leaves the mask in place. The mask hides once
    /// the stack is empty.
    pub fn release(&self, id: OverlayId) -> Release {
        let outcome = self.inner.stack.borrow_mut().release(id);
        self.undelegate(&id.to_string());
        match outcome {
            Release::Top => self.restack(),
            Release::Buried | Release::Absent => {}
        }
        if self.inner.stack.borrow().is_empty() {
            self.inner.overlay.borrow_mut().hide();
        }
        if outcome != Release::Absent {
            tracing::debug!(overlay = %id, ?outcome, depth = self.depth(), "mask released");
        }
        outcome
    }

    /// Re-sync position and z-index with the current top overlay, dropping
    /// overlays that no longer exist.
    pub fn refresh(&self) {
        self.restack();
        if self.inner.stack.borrow().is_empty() {
            self.inner.overlay.borrow_mut().hide();
        }
    }

    /// Bind `handler` to clicks on the mask under `namespace`, replacing any
    /// handler already bound there.
    pub fn delegate(&self, namespace: &str, handler: Rc<dyn Fn()>) {
        let document = self.document();
        let target = Target::Element(self.element());
        let spec = format!("click.{namespace}");
        document.off(target, &spec);
        document.on(target, &spec, Rc::new(move |_, _| handler()));
    }

    /// Unbind the click handler under `namespace`.
    pub fn undelegate(&self, namespace: &str) -> usize {
        let document = self.document();
        document.off(Target::Element(self.element()), &format!("click.{namespace}"))
    }

    fn document(&self) -> Document {
        self.inner.overlay.borrow().document().clone()
    }

    fn restack(&self) {
        let top = {
            let mut stack = self.inner.stack.borrow_mut();
            let pruned = stack.prune();
            if pruned > 0 {
                tracing::debug!(pruned, "dropped dead overlays from mask stack");
            }
            stack.top()
        };
        if let Some(top) = top {
            self.place_beneath(top.as_ref());
        }
    }

    fn place_beneath(&self, overlay: &dyn Masked) {
        let z_index = overlay.mask_z_index();
        let anchor = overlay.mask_anchor();
        let mut mask = self.inner.overlay.borrow_mut();
        mask.set_z_index(z_index);
        mask.show();
        if let Some(anchor) = anchor {
            mask.document().insert_before(mask.element(), anchor);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use veil_core::Size;

    use super::*;

    struct Panel {
        id: OverlayId,
        element: ElementId,
        z: i32,
    }

    impl Masked for Panel {
        fn overlay_id(&self) -> OverlayId {
            self.id
        }
        fn mask_anchor(&self) -> Option<ElementId> {
            Some(self.element)
        }
        fn mask_z_index(&self) -> i32 {
            self.z
        }
    }

    fn panel(doc: &Document, z: i32) -> Rc<dyn Masked> {
        let element = doc.create_element("div");
        doc.append_child(doc.body(), element);
        Rc::new(Panel {
            id: OverlayId::next(),
            element,
            z,
        })
    }

    fn beneath(doc: &Document, mask: &Mask, overlay: &Rc<dyn Masked>) -> bool {
        overlay
            .mask_anchor()
            .is_some_and(|el| doc.previous_sibling(el) == Some(mask.element()))
    }

    #[test]
    fn follows_most_recent_not_highest_z() {
        let doc = Document::new(Size::new(800, 600));
        let mask = Mask::new(&doc);
        let high = panel(&doc, 5000);
        let low = panel(&doc, 10);

        mask.register(&high);
        mask.register(&low);
        assert!(beneath(&doc, &mask, &low));
        assert_eq!(mask.z_index(), 10);

        assert_eq!(mask.release(low.overlay_id()), Release::Top);
        assert!(beneath(&doc, &mask, &high));
        assert_eq!(mask.z_index(), 5000);
        assert!(mask.is_visible());
    }

    #[test]
    fn buried_release_keeps_position() {
        let doc = Document::new(Size::new(800, 600));
        let mask = Mask::new(&doc);
        let a = panel(&doc, 1);
        let b = panel(&doc, 2);
        mask.register(&a);
        mask.register(&b);

        assert_eq!(mask.release(a.overlay_id()), Release::Buried);
        assert!(beneath(&doc, &mask, &b));
        assert_eq!(mask.stack(), vec![b.overlay_id()]);

        assert_eq!(mask.release(b.overlay_id()), Release::Top);
        assert!(!mask.is_visible());
        assert!(!doc.is_visible(mask.element()));
    }

    #[test]
    fn absent_release_is_silent() {
        let doc = Document::new(Size::new(800, 600));
        let mask = Mask::new(&doc);
        assert_eq!(mask.release(OverlayId::next()), Release::Absent);
        assert!(!mask.is_visible());
        assert_eq!(mask.depth(), 0);
    }

    #[test]
    fn delegate_replaces_same_namespace() {
        let doc = Document::new(Size::new(800, 600));
        let mask = Mask::new(&doc);
        let hits = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let hits = Rc::clone(&hits);
            mask.delegate("overlay-x", Rc::new(move || hits.set(hits.get() + 1)));
        }
        assert_eq!(doc.listener_count(Target::Element(mask.element())), 1);
        doc.click(mask.element());
        assert_eq!(hits.get(), 1);
        assert_eq!(mask.undelegate("overlay-x"), 1);
    }

    #[test]
    fn dropped_top_is_skipped_on_release() {
        let doc = Document::new(Size::new(800, 600));
        let mask = Mask::new(&doc);
        let a = panel(&doc, 1);
        let b = panel(&doc, 2);
        let c = panel(&doc, 3);
        mask.register(&a);
        mask.register(&b);
        mask.register(&c);
        drop(b);

        mask.release(c.overlay_id());
        assert_eq!(mask.stack(), vec![a.overlay_id()]);
        assert!(beneath(&doc, &mask, &a));
    }
}
