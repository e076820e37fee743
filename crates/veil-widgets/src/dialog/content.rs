#![forbid(unsafe_code)]

//! Content classification and rendering.
//!
//! A string content value starting with `http://`, `https://`, `/`, `./`,
//! or `../` is remote and loaded on show; anything else renders inline, as
//! markup when it parses as a fragment and as literal text otherwise.
//!
//! # Failure Modes
//!
//! | Situation | Behavior |
//! |-----------|----------|
//! | Inline value is not markup | Rendered as literal text |
//! | Content element is the container or an ancestor of it | Ignored, warning logged |
//! | Load completes after being superseded | Completion dropped |

use std::sync::LazyLock;

use regex::Regex;
use veil_core::{Document, ElementId};

use super::attrs::Content;

const REMOTE_PREFIXES: [&str; 5] = ["http://", "https://", "/", "./", "../"];

static REMOTE_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(https?://|/|\./|\.\./)")
        .map_err(|err| tracing::error!(%err, "remote url pattern failed to compile"))
        .ok()
});

/// Whether `value` names remote content.
#[must_use]
pub fn is_remote_url(value: &str) -> bool {
    match REMOTE_URL.as_ref() {
        Some(re) => re.is_match(value),
        None => REMOTE_PREFIXES.iter().any(|p| value.starts_with(p)),
    }
}

/// Replace the children of `container` with inline `content`.
pub(crate) fn render_inline(document: &Document, container: ElementId, content: &Content) {
    match content {
        Content::Empty => document.empty(container),
        Content::Element(element) => {
            if *element == container || document.contains(*element, container) {
                tracing::warn!(
                    element = %element,
                    "content element contains the content region; ignored"
                );
                return;
            }
            document.detach(*element);
            document.empty(container);
            document.append_child(container, *element);
        }
        Content::Markup(value) => document.set_markup(container, value),
    }
}

/// Bookkeeping for the remote load of one dialog.
///
/// Every load gets a sequence number. Only the newest pending load may
/// complete; changing the content supersedes whatever is in flight.
#[derive(Debug, Default)]
pub(crate) struct LoadState {
    seq: u64,
    pending: Option<(u64, String)>,
}

impl LoadState {
    /// Start loading `url`. Returns `None` when the same URL is already in
    /// flight, so repeated shows share one completion.
    pub(crate) fn begin(&mut self, url: &str) -> Option<u64> {
        if self.pending.as_ref().is_some_and(|(_, u)| u == url) {
            return None;
        }
        self.seq += 1;
        self.pending = Some((self.seq, url.to_owned()));
        Some(self.seq)
    }

    /// Abandon any pending load.
    pub(crate) fn supersede(&mut self) {
        self.seq += 1;
        self.pending = None;
    }

    /// Whether load `seq` is still the pending one; clears it if so.
    pub(crate) fn finish(&mut self, seq: u64) -> bool {
        if self.pending.as_ref().is_some_and(|(s, _)| *s == seq) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
