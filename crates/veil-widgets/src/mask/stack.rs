#![forbid(unsafe_code)]

//! Ordered record of the overlays currently displaying the mask.
//!
//! # Invariants
//!
//! - No overlay appears twice.
//! - Order is show order: the last entry is the most recently shown.
//! - Entries hold overlays weakly; a dropped overlay is pruned instead of
//!   keeping the mask alive for it.
//!
//! # Failure Modes
//!
//! - `release()` of an absent id returns [`Release::Absent`] (no panic).
//! - `push()` of a present id moves it to the top instead of duplicating it.

use std::fmt;
use std::rc::{Rc, Weak};

use veil_core::ElementId;

use crate::overlay::OverlayId;

/// Something the mask can sit beneath.
pub trait Masked {
    /// Id of the overlay.
    fn overlay_id(&self) -> OverlayId;

    /// Element the mask is placed immediately before, if it still exists.
    fn mask_anchor(&self) -> Option<ElementId>;

    /// Stacking order the mask adopts while this overlay is on top.
    fn mask_z_index(&self) -> i32;
}

/// Outcome of [`MaskStack::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// The overlay was not on the stack and is now on top.
    Added,
    /// The overlay was buried and has been moved to the top.
    Raised,
    /// The overlay already was the top entry.
    AlreadyTop,
}

/// Outcome of [`MaskStack::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The overlay was the top entry and has been popped.
    Top,
    /// The overlay was below the top and has been spliced out.
    Buried,
    /// The overlay was not on the stack.
    Absent,
}

struct Entry {
    id: OverlayId,
    overlay: Weak<dyn Masked>,
}

/// Ordered set of masked overlays, bottom to top.
#[derive(Default)]
pub struct MaskStack {
    entries: Vec<Entry>,
}

impl fmt::Debug for MaskStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

impl MaskStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `overlay` on top.
    pub fn push(&mut self, overlay: &Rc<dyn Masked>) -> Push {
        let id = overlay.overlay_id();
        let outcome = match self.position(id) {
            Some(index) if index + 1 == self.entries.len() => return Push::AlreadyTop,
            Some(index) => {
                self.entries.remove(index);
                Push::Raised
            }
            None => Push::Added,
        };
        self.entries.push(Entry {
            id,
            overlay: Rc::downgrade(overlay),
        });
        outcome
    }

    /// Remove `id`, reporting where it was.
    pub fn release(&mut self, id: OverlayId) -> Release {
        match self.position(id) {
            Some(index) if index + 1 == self.entries.len() => {
                self.entries.pop();
                Release::Top
            }
            Some(index) => {
                self.entries.remove(index);
                Release::Buried
            }
            None => Release::Absent,
        }
    }

    /// Drop entries whose overlay no longer exists. Returns how many were
    /// dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.overlay.strong_count() > 0);
        before - self.entries.len()
    }

    /// The top-most live overlay.
    #[must_use]
    pub fn top(&self) -> Option<Rc<dyn Masked>> {
        self.entries.last().and_then(|e| e.overlay.upgrade())
    }

    #[must_use]
    pub fn top_id(&self) -> Option<OverlayId> {
        self.entries.last().map(|e| e.id)
    }

    #[must_use]
    pub fn contains(&self, id: OverlayId) -> bool {
        self.position(id).is_some()
    }

    /// Ids bottom to top.
    #[must_use]
    pub fn ids(&self) -> Vec<OverlayId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: OverlayId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}
