#![forbid(unsafe_code)]

//! Core primitives for Veil overlays.
//!
//! This crate provides:
//! - [`Document`]: a headless, single-threaded element tree with styles,
//!   focus, listeners, and a minimal block layout
//! - [`Event`] and friends for clicks and keyboard input
//! - [`geometry`] types shared by layout and positioning
//! - [`markup`] fragment parsing and [`selector`] matching

pub mod document;
pub mod event;
pub mod geometry;
pub mod markup;
pub mod selector;

pub use document::{
    CHAR_WIDTH, DEFAULT_VIEWPORT, Dimension, DimensionError, Display, Document, ElementId, FadeIn,
    Handler, LINE_HEIGHT, Style, Target,
};
pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton};
pub use geometry::{Point, Rect, Size};
pub use markup::MarkupNode;
pub use selector::{Selector, SelectorError};
