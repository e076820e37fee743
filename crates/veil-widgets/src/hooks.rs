#![forbid(unsafe_code)]

//! Lifecycle hooks and event subscriptions.
//!
//! [`Hooks`] keeps ordered `before`/`after` callbacks per [`Lifecycle`]
//! transition; [`Emitter`] keeps subscribers per [`DialogEvent`]. Both hand
//! out snapshots, so the owner can release its borrow before running them
//! and a callback may register further callbacks or drive the widget that
//! invoked it.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Callback receiving the widget handle.
pub type Callback<T> = Rc<dyn Fn(&T)>;

/// Lifecycle transitions that accept hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Render,
    Show,
    Hide,
    Destroy,
}

impl Lifecycle {
    pub const ALL: [Self; 4] = [Self::Render, Self::Show, Self::Hide, Self::Destroy];

    const fn index(self) -> usize {
        match self {
            Self::Render => 0,
            Self::Show => 1,
            Self::Hide => 2,
            Self::Destroy => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a dialog emits to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogEvent {
    Render,
    Show,
    Hide,
    Destroy,
    /// Remote content finished loading (successfully or not).
    CompleteShow,
}

impl DialogEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Destroy => "destroy",
            Self::CompleteShow => "complete:show",
        }
    }
}

impl From<Lifecycle> for DialogEvent {
    fn from(stage: Lifecycle) -> Self {
        match stage {
            Lifecycle::Render => Self::Render,
            Lifecycle::Show => Self::Show,
            Lifecycle::Hide => Self::Hide,
            Lifecycle::Destroy => Self::Destroy,
        }
    }
}

impl fmt::Display for DialogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised event name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialog event {0:?}")]
pub struct UnknownEvent(pub String);

impl FromStr for DialogEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "render" => Ok(Self::Render),
            "show" => Ok(Self::Show),
            "hide" => Ok(Self::Hide),
            "destroy" => Ok(Self::Destroy),
            "complete:show" => Ok(Self::CompleteShow),
            other => Err(UnknownEvent(other.to_owned())),
        }
    }
}

/// Ordered `before`/`after` callbacks per lifecycle transition.
pub struct Hooks<T> {
    before: [Vec<Callback<T>>; 4],
    after: [Vec<Callback<T>>; 4],
}

impl<T> Default for Hooks<T> {
    fn default() -> Self {
        Self {
            before: Default::default(),
            after: Default::default(),
        }
    }
}

impl<T> fmt::Debug for Hooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.iter().map(Vec::len).collect::<Vec<_>>())
            .field("after", &self.after.iter().map(Vec::len).collect::<Vec<_>>())
            .finish()
    }
}

impl<T> Hooks<T> {
    pub fn before(&mut self, stage: Lifecycle, callback: Callback<T>) {
        self.before[stage.index()].push(callback);
    }

    pub fn after(&mut self, stage: Lifecycle, callback: Callback<T>) {
        self.after[stage.index()].push(callback);
    }

    /// Callbacks to run before `stage`, in registration order.
    #[must_use]
    pub fn before_snapshot(&self, stage: Lifecycle) -> Vec<Callback<T>> {
        self.before[stage.index()].clone()
    }

    /// Callbacks to run after `stage`, in registration order.
    #[must_use]
    pub fn after_snapshot(&self, stage: Lifecycle) -> Vec<Callback<T>> {
        self.after[stage.index()].clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.before.iter().chain(&self.after).map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.before.iter_mut().chain(&mut self.after).for_each(Vec::clear);
    }
}

/// Handle returned by [`Emitter::on`], used to unsubscribe one callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subscribers per [`DialogEvent`].
pub struct Emitter<T> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, DialogEvent, Callback<T>)>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            subscribers: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T> Emitter<T> {
    /// Subscribe `callback` to `event`.
    pub fn on(&mut self, event: DialogEvent, callback: Callback<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, event, callback));
        id
    }

    /// Remove every subscriber to `event`. Returns how many were removed.
    pub fn off(&mut self, event: DialogEvent) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|(_, e, _)| *e != event);
        before - self.subscribers.len()
    }

    /// Remove one subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _, _)| *sid != id);
        before != self.subscribers.len()
    }

    /// Subscribers to `event`, in subscription order.
    #[must_use]
    pub fn snapshot(&self, event: DialogEvent) -> Vec<Callback<T>> {
        self.subscribers
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, cb)| Rc::clone(cb))
            .collect()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn hooks_keep_registration_order_per_stage() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut hooks: Hooks<u8> = Hooks::default();
        for tag in ["a", "b"] {
            let log = Rc::clone(&log);
            hooks.after(Lifecycle::Show, Rc::new(move |_| log.borrow_mut().push(tag)));
        }
        let log2 = Rc::clone(&log);
        hooks.before(Lifecycle::Hide, Rc::new(move |_| log2.borrow_mut().push("h")));

        for cb in hooks.after_snapshot(Lifecycle::Show) {
            cb(&0);
        }
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(hooks.before_snapshot(Lifecycle::Show).is_empty());
        assert_eq!(hooks.len(), 3);
        hooks.clear();
        assert!(hooks.is_empty());
    }

    #[test]
    fn emitter_off_and_unsubscribe() {
        let mut emitter: Emitter<()> = Emitter::default();
        let a = emitter.on(DialogEvent::Show, Rc::new(|_| {}));
        emitter.on(DialogEvent::Show, Rc::new(|_| {}));
        emitter.on(DialogEvent::CompleteShow, Rc::new(|_| {}));

        assert!(emitter.unsubscribe(a));
        assert!(!emitter.unsubscribe(a));
        assert_eq!(emitter.snapshot(DialogEvent::Show).len(), 1);
        assert_eq!(emitter.off(DialogEvent::CompleteShow), 1);
        assert!(emitter.snapshot(DialogEvent::CompleteShow).is_empty());
    }

    #[test]
    fn event_names_round_trip() {
        for event in [
            DialogEvent::Render,
            DialogEvent::Show,
            DialogEvent::Hide,
            DialogEvent::Destroy,
            DialogEvent::CompleteShow,
        ] {
            assert_eq!(event.as_str().parse::<DialogEvent>(), Ok(event));
        }
        assert_eq!(
            "complete".parse::<DialogEvent>(),
            Err(UnknownEvent("complete".into()))
        );
        assert_eq!(DialogEvent::from(Lifecycle::Hide), DialogEvent::Hide);
    }
}
