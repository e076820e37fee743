#![forbid(unsafe_code)]

//! Namespaced event listener registry.
//!
//! Listener specs follow the `event.namespace` convention:
//!
//! | Spec | `on` | `off` |
//! |------|------|-------|
//! | `"click"` | click, no namespace | every click listener |
//! | `"click.overlay-3"` | click in `overlay-3` | clicks in `overlay-3` |
//! | `".overlay-3"` | ignored | every listener in `overlay-3` |

use std::rc::Rc;

use ahash::AHashMap;

use super::Target;
use crate::event::Event;

/// Listener callback. Receives the event and the target it is currently
/// being delivered to.
pub type Handler = Rc<dyn Fn(&Event, Target)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListenerSpec<'a> {
    pub(crate) event: Option<&'a str>,
    pub(crate) namespace: Option<&'a str>,
}

impl<'a> ListenerSpec<'a> {
    pub(crate) fn parse(spec: &'a str) -> Self {
        let (event, namespace) = match spec.split_once('.') {
            Some((event, ns)) => (event, Some(ns)),
            None => (spec, None),
        };
        Self {
            event: (!event.is_empty()).then_some(event),
            namespace: namespace.filter(|ns| !ns.is_empty()),
        }
    }

    fn covers(&self, listener: &Listener) -> bool {
        self.event.is_none_or(|e| e == listener.event)
            && self
                .namespace
                .is_none_or(|ns| listener.namespace.as_deref() == Some(ns))
    }
}

struct Listener {
    event: String,
    namespace: Option<String>,
    handler: Handler,
}

#[derive(Default)]
pub(crate) struct Listeners {
    by_target: AHashMap<Target, Vec<Listener>>,
}

impl Listeners {
    /// Register a handler. Returns `false` when the spec names no event.
    pub(crate) fn add(&mut self, target: Target, spec: &str, handler: Handler) -> bool {
        let spec = ListenerSpec::parse(spec);
        let Some(event) = spec.event else {
            return false;
        };
        self.by_target.entry(target).or_default().push(Listener {
            event: event.to_owned(),
            namespace: spec.namespace.map(str::to_owned),
            handler,
        });
        true
    }

    /// Remove every handler covered by `spec`. Returns how many were removed.
    pub(crate) fn remove(&mut self, target: Target, spec: &str) -> usize {
        let spec = ListenerSpec::parse(spec);
        let Some(list) = self.by_target.get_mut(&target) else {
            return 0;
        };
        let before = list.len();
        list.retain(|l| !spec.covers(l));
        let removed = before - list.len();
        if list.is_empty() {
            self.by_target.remove(&target);
        }
        removed
    }

    pub(crate) fn clear_target(&mut self, target: Target) {
        self.by_target.remove(&target);
    }

    /// Handlers registered on `target` for `event`, in registration order.
    pub(crate) fn snapshot(&self, target: Target, event: &str) -> Vec<Handler> {
        self.by_target
            .get(&target)
            .map(|list| {
                list.iter()
                    .filter(|l| l.event == event)
                    .map(|l| Rc::clone(&l.handler))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, target: Target) -> usize {
        self.by_target.get(&target).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ElementId;

    fn noop() -> Handler {
        Rc::new(|_, _| {})
    }

    #[test]
    fn spec_parsing() {
        assert_eq!(
            ListenerSpec::parse("click.overlay-1"),
            ListenerSpec {
                event: Some("click"),
                namespace: Some("overlay-1")
            }
        );
        assert_eq!(
            ListenerSpec::parse(".esc"),
            ListenerSpec {
                event: None,
                namespace: Some("esc")
            }
        );
        assert_eq!(
            ListenerSpec::parse("keyup"),
            ListenerSpec {
                event: Some("keyup"),
                namespace: None
            }
        );
    }

    #[test]
    fn namespace_removal_is_scoped() {
        let mut listeners = Listeners::default();
        let target = Target::Element(ElementId(4));
        assert!(listeners.add(target, "click.a", noop()));
        assert!(listeners.add(target, "click.b", noop()));
        assert!(listeners.add(target, "keyup.a", noop()));
        assert_eq!(listeners.remove(target, "click.a"), 1);
        assert_eq!(listeners.count(target), 2);
        assert_eq!(listeners.remove(target, ".a"), 1);
        assert_eq!(listeners.snapshot(target, "click").len(), 1);
    }

    #[test]
    fn spec_without_event_is_rejected() {
        let mut listeners = Listeners::default();
        assert!(!listeners.add(Target::Document, ".ns", noop()));
        assert_eq!(listeners.count(Target::Document), 0);
    }
}
