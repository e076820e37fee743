#![forbid(unsafe_code)]

//! Input events delivered to document listeners.
//!
//! Only the subset an overlay needs is modelled: pointer clicks and
//! keyboard presses/releases. Each event maps onto a listener event name
//! (`"click"`, `"keydown"`, `"keyup"`) used by
//! [`Document::on`](crate::Document::on).

use bitflags::bitflags;

use crate::document::ElementId;

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL = 0b0010;
        const ALT = 0b0100;
        const META = 0b1000;
    }
}

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Escape,
    Enter,
    Tab,
    Backspace,
    Char(char),
}

impl KeyCode {
    /// Legacy numeric key code, as reported by `KeyboardEvent.keyCode`.
    #[must_use]
    pub fn legacy_code(self) -> u32 {
        match self {
            Self::Escape => 27,
            Self::Enter => 13,
            Self::Tab => 9,
            Self::Backspace => 8,
            Self::Char(c) => c.to_ascii_uppercase() as u32,
        }
    }
}

/// Whether a key went down or came back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Release,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    /// The same key, released.
    #[must_use]
    pub const fn released(mut self) -> Self {
        self.kind = KeyEventKind::Release;
        self
    }

    /// Attach modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this is an Escape key event.
    #[inline]
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.code == KeyCode::Escape
    }
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// An input event dispatched through the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A click whose original target is `target`.
    Click {
        target: ElementId,
        button: MouseButton,
    },
    /// A keyboard event, optionally targeted at a focused element.
    Key {
        target: Option<ElementId>,
        key: KeyEvent,
    },
}

impl Event {
    /// Listener event name this event is delivered under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Key { key, .. } => match key.kind {
                KeyEventKind::Press => "keydown",
                KeyEventKind::Release => "keyup",
            },
        }
    }

    /// Original target element, if any.
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Self::Click { target, .. } => Some(*target),
            Self::Key { target, .. } => *target,
        }
    }

    /// The key payload for keyboard events.
    #[must_use]
    pub fn key(&self) -> Option<&KeyEvent> {
        match self {
            Self::Key { key, .. } => Some(key),
            Self::Click { .. } => None,
        }
    }
}
