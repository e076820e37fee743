#![forbid(unsafe_code)]

//! Modal dialogs for veil documents.
//!
//! The centrepiece is [`Dialog`]: a templated [`Overlay`] that shows inline
//! or remote content, closes on its close control, Escape, or (optionally)
//! a mask click, and returns focus to whatever opened it. All masked
//! overlays on a [`Page`] share one [`Mask`].
//!
//! ```
//! use veil_widgets::{Dialog, DialogConfig};
//!
//! let dialog = Dialog::new(DialogConfig::new().content("<p>Saved.</p>"));
//! dialog.show();
//! assert!(dialog.is_visible());
//! assert!(dialog.page().mask().is_visible());
//! dialog.hide();
//! assert!(!dialog.page().mask().is_visible());
//! ```

pub mod dialog;
pub mod hooks;
pub mod mask;
pub mod overlay;
pub mod page;
pub mod template;

pub use dialog::{
    Attr, AttrKey, ConfigError, Content, Dialog, DialogConfig, DialogOptions, Effect, Phase,
    Trigger,
};
pub use hooks::{DialogEvent, Emitter, Hooks, Lifecycle, SubscriptionId};
pub use mask::{Mask, MaskStack, Masked, Push, Release};
pub use overlay::{Align, Anchor, LayoutStats, Overlay, OverlayId};
pub use page::Page;
pub use template::{DialogTemplate, MarkupTemplate, Template, TemplateError};

pub use veil_core;
pub use veil_runtime;

#[cfg(feature = "telemetry")]
pub use veil_runtime::init_tracing;
