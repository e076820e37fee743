#![forbid(unsafe_code)]

//! Deferred content fetching.

use std::fmt;
use std::rc::Rc;

use crate::loader::{ContentLoader, LoadError, StaticLoader};
use crate::scheduler::TaskQueue;

/// A [`ContentLoader`] bound to a [`TaskQueue`].
///
/// [`Fetcher::fetch`] never completes inline: the load and its completion
/// run as one deferred task, and the completion runs whether the load
/// succeeded or not.
#[derive(Clone)]
pub struct Fetcher {
    loader: Rc<dyn ContentLoader>,
    queue: TaskQueue,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl Default for Fetcher {
    /// A fetcher with no routes on the global queue.
    fn default() -> Self {
        Self::new(Rc::new(StaticLoader::new()), TaskQueue::global())
    }
}

impl Fetcher {
    /// Pair `loader` with `queue`.
    #[must_use]
    pub fn new(loader: Rc<dyn ContentLoader>, queue: TaskQueue) -> Self {
        Self { loader, queue }
    }

    /// The queue completions run on.
    #[must_use]
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Load `url` on the queue and hand the outcome to `done`.
    pub fn fetch(&self, url: &str, done: impl FnOnce(Result<String, LoadError>) + 'static) {
        let loader = Rc::clone(&self.loader);
        let url = url.to_owned();
        tracing::debug!(%url, "fetch deferred");
        self.queue.defer(move || {
            let outcome = loader.load(&url);
            if let Err(err) = &outcome {
                tracing::debug!(%url, error = %err, "fetch failed");
            }
            done(outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn completion_is_deferred() {
        let loader = Rc::new(StaticLoader::new().route("/a", "A"));
        let fetcher = Fetcher::new(loader.clone(), TaskQueue::new());
        let out = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&out);
        fetcher.fetch("/a", move |r| *slot.borrow_mut() = Some(r));

        assert!(out.borrow().is_none());
        assert_eq!(loader.loads(), 0);
        assert_eq!(fetcher.queue().run_until_idle(), 1);
        assert_eq!(*out.borrow(), Some(Ok("A".to_owned())));
    }

    #[test]
    #[tracing_test::traced_test]
    fn completion_runs_on_failure() {
        let fetcher = Fetcher::new(Rc::new(StaticLoader::new()), TaskQueue::new());
        let out = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&out);
        fetcher.fetch("/missing", move |r| *slot.borrow_mut() = Some(r));
        fetcher.queue().run_until_idle();
        assert!(matches!(
            *out.borrow(),
            Some(Err(LoadError::NotFound { .. }))
        ));
        assert!(logs_contain("fetch failed"));
    }
}
