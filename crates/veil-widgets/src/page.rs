#![forbid(unsafe_code)]

//! Per-page shared state.
//!
//! A [`Page`] bundles what every dialog on a page shares: the [`Document`],
//! the lazily created [`Mask`], and the [`Fetcher`] used for remote content.
//! Dialogs hold a `Page` handle instead of reaching for globals, so tests can
//! run isolated pages side by side. [`Page::global`] is the thread-local page
//! used by [`Dialog::new`](crate::Dialog::new).

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use veil_core::Document;
use veil_runtime::{Fetcher, TaskQueue};

use crate::mask::Mask;

thread_local! {
    static GLOBAL_PAGE: Page = Page::new(Document::global(), Fetcher::default());
}

struct PageInner {
    document: Document,
    mask: OnceCell<Mask>,
    fetcher: RefCell<Fetcher>,
}

/// Shared handle to a page.
#[derive(Clone)]
pub struct Page {
    inner: Rc<PageInner>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("document", &self.inner.document)
            .field("mask", &self.inner.mask.get())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Page {
    #[must_use]
    pub fn new(document: Document, fetcher: Fetcher) -> Self {
        Self {
            inner: Rc::new(PageInner {
                document,
                mask: OnceCell::new(),
                fetcher: RefCell::new(fetcher),
            }),
        }
    }

    /// Access the global page (thread-local).
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_PAGE.with(Clone::clone)
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// The page mask, created on first use.
    #[must_use]
    pub fn mask(&self) -> Mask {
        self.inner
            .mask
            .get_or_init(|| Mask::new(&self.inner.document))
            .clone()
    }

    /// The mask if something has already created it.
    #[must_use]
    pub fn existing_mask(&self) -> Option<Mask> {
        self.inner.mask.get().cloned()
    }

    #[must_use]
    pub fn fetcher(&self) -> Fetcher {
        self.inner.fetcher.borrow().clone()
    }

    /// Replace the fetcher used for loads started from now on.
    pub fn set_fetcher(&self, fetcher: Fetcher) {
        *self.inner.fetcher.borrow_mut() = fetcher;
    }

    /// The queue remote loads complete on.
    #[must_use]
    pub fn queue(&self) -> TaskQueue {
        self.inner.fetcher.borrow().queue().clone()
    }

    /// Run pending tasks until the queue is idle. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        self.queue().run_until_idle()
    }
}

#[cfg(test)]
mod tests {
    use veil_core::Size;

    use super::*;

    #[test]
    fn mask_is_created_once() {
        let page = Page::new(Document::new(Size::new(640, 480)), Fetcher::default());
        assert!(page.existing_mask().is_none());
        let first = page.mask();
        assert_eq!(page.mask(), first);
        assert_eq!(page.existing_mask(), Some(first.clone()));
        assert_eq!(
            page.document().children(page.document().body()),
            vec![first.element()]
        );
    }

    #[test]
    fn global_page_is_shared() {
        assert_eq!(Page::global(), Page::global());
        assert_eq!(Page::global().document(), &Document::global());
    }
}
