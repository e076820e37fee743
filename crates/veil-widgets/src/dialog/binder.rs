#![forbid(unsafe_code)]

//! Trigger, keyboard, and close-control bindings.
//!
//! Every listener a dialog installs lives under its own namespace (the
//! rendered [`OverlayId`](crate::OverlayId)), so unbinding never touches
//! listeners owned by anyone else. Handlers hold the dialog weakly.

use std::rc::Rc;

use veil_core::{Document, ElementId, KeyEvent, Target};

use super::Dialog;
use super::attrs::Trigger;

/// Give `element` a tab index unless it already has one.
pub(super) fn make_tabbable(document: &Document, element: ElementId) {
    if document.attr(element, "tabindex").is_none() {
        document.set_attr(element, "tabindex", "-1");
    }
}

/// Elements a trigger currently refers to.
pub(super) fn resolve(document: &Document, trigger: &Trigger) -> Vec<ElementId> {
    match trigger {
        Trigger::None => Vec::new(),
        Trigger::Elements(elements) => elements
            .iter()
            .copied()
            .filter(|&el| document.is_alive(el))
            .collect(),
        Trigger::Selector(selector) => document.query(selector),
    }
}

/// Clicking any of `triggers` records it as the active trigger and shows
/// the dialog.
pub(super) fn bind_triggers(dialog: &Dialog, triggers: &[ElementId]) {
    let document = dialog.document();
    let spec = format!("click.{}", dialog.id());
    for &trigger in triggers {
        let weak = dialog.downgrade();
        document.on(
            Target::Element(trigger),
            &spec,
            Rc::new(move |_, current| {
                let Some(dialog) = Dialog::upgrade(&weak) else {
                    return;
                };
                if let Target::Element(element) = current {
                    dialog.set_active_trigger(element);
                }
                dialog.show();
            }),
        );
    }
}

pub(super) fn unbind_triggers(dialog: &Dialog, triggers: &[ElementId]) {
    let document = dialog.document();
    let spec = format!("click.{}", dialog.id());
    for &trigger in triggers {
        document.off(Target::Element(trigger), &spec);
    }
}

/// Clicking the close control hides the dialog.
pub(super) fn bind_close(dialog: &Dialog, close: ElementId) {
    let weak = dialog.downgrade();
    dialog.document().on(
        Target::Element(close),
        &format!("click.{}", dialog.id()),
        Rc::new(move |_, _| {
            if let Some(dialog) = Dialog::upgrade(&weak) {
                dialog.hide();
            }
        }),
    );
}

fn escape_spec(dialog: &Dialog) -> String {
    format!("keyup.esc-{}", dialog.id())
}

/// Releasing Escape anywhere in the document hides the dialog if visible.
pub(super) fn bind_escape(dialog: &Dialog) {
    let weak = dialog.downgrade();
    dialog.document().on(
        Target::Document,
        &escape_spec(dialog),
        Rc::new(move |event, _| {
            if !event.key().is_some_and(KeyEvent::is_escape) {
                return;
            }
            if let Some(dialog) = Dialog::upgrade(&weak)
                && dialog.is_visible()
            {
                dialog.hide();
            }
        }),
    );
}

pub(super) fn unbind_escape(dialog: &Dialog) {
    dialog
        .document()
        .off(Target::Document, &escape_spec(dialog));
}
