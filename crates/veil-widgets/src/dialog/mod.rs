#![forbid(unsafe_code)]

//! Modal dialog.
//!
//! A [`Dialog`] is an [`Overlay`] with a templated skeleton, a content
//! region that renders inline markup or loads remote content, a close
//! control, trigger elements, Escape-to-close, focus handling, and a seat on
//! the page's shared [`Mask`].
//!
//! # Lifecycle
//!
//! ```text
//! unrendered ──render──▶ rendered ◀──show/hide──▶ (visible | hidden)
//!      │                     │
//!      └──────destroy────────┴──────────▶ destroyed (terminal)
//! ```
//!
//! `show` renders on demand. Each transition runs user `before` hooks, the
//! transition itself, built-in follow-ups, user `after` hooks, and finally
//! emits the matching [`DialogEvent`].
//!
//! | Transition | Built-in follow-ups, in order |
//! |------------|-------------------------------|
//! | show | position pass, mask registration, focus the root |
//! | hide | mask release, focus the active trigger |
//! | destroy | remove the element, mask release |
//!
//! # Invariants
//!
//! 1. `is_visible()` is `false` after construction and `true` right after
//!    `show()`, remote content or not.
//! 2. Hiding or destroying always releases the mask seat, whatever
//!    `hasMask` currently says.
//! 3. No internal borrow is held while user callbacks run.
//! 4. A remote load completes at most once per load started; loads started
//!    while the same URL is in flight share that completion.
//!
//! # Failure Modes
//!
//! | Situation | Behavior |
//! |-----------|----------|
//! | Any operation after `destroy` | Warning logged, no effect |
//! | Remote load fails | Warning logged, `complete:show` still emitted |
//! | Load completes after destroy or content change | Completion dropped |
//! | Load completes while hidden | Content updated, no positioning pass |

mod attrs;
mod binder;
mod config;
mod content;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use veil_core::{Dimension, Document, ElementId, Selector};
use veil_runtime::LoadError;
use web_time::Duration;

pub use attrs::{Attr, AttrKey, Content, Effect, EffectFn, Trigger, UnknownAttr, UnknownEffect};
pub use config::{
    AlignOptions, ConfigError, DEFAULT_CLASS_PREFIX, DEFAULT_CLOSE_TPL, DEFAULT_Z_INDEX,
    DialogConfig, DialogOptions, LengthOption,
};
pub use content::is_remote_url;

use crate::hooks::{DialogEvent, Emitter, Hooks, Lifecycle, SubscriptionId};
use crate::mask::{Mask, Masked};
use crate::overlay::{Align, LayoutStats, Overlay, OverlayId};
use crate::page::Page;
use content::LoadState;

/// Duration of the `fade` effect.
pub const FADE_DURATION: Duration = Duration::from_millis(300);

/// Where a dialog is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unrendered,
    Rendered,
    Destroyed,
}

struct State {
    phase: Phase,
    overlay: Overlay,
    content_element: ElementId,
    close_element: Option<ElementId>,
    class_prefix: String,
    content: Content,
    trigger: Trigger,
    triggers: Vec<ElementId>,
    has_mask: bool,
    hide_on_click_mask: bool,
    hide_on_key_escape: bool,
    close_tpl: String,
    effect: Effect,
    active_trigger: Option<ElementId>,
    load: LoadState,
}

struct DialogInner {
    id: OverlayId,
    page: Page,
    state: RefCell<State>,
    hooks: RefCell<Hooks<Dialog>>,
    events: RefCell<Emitter<Dialog>>,
}

impl Masked for DialogInner {
    fn overlay_id(&self) -> OverlayId {
        self.id
    }

    fn mask_anchor(&self) -> Option<ElementId> {
        let state = self.state.borrow();
        (state.phase != Phase::Destroyed).then(|| state.overlay.element())
    }

    fn mask_z_index(&self) -> i32 {
        self.state.borrow().overlay.z_index()
    }
}

/// Handle to a modal dialog.
///
/// Cloning is cheap; all clones drive the same dialog.
#[derive(Clone)]
pub struct Dialog {
    inner: Rc<DialogInner>,
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Dialog")
            .field("id", &self.inner.id)
            .field("phase", &state.phase)
            .field("visible", &state.overlay.is_visible())
            .field("element", &state.overlay.element())
            .finish()
    }
}

impl PartialEq for Dialog {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn find_role(document: &Document, root: ElementId, role: &str) -> Option<ElementId> {
    let selector = Selector::parse(&format!("[data-role={role}]")).ok()?;
    document.find(root, &selector)
}

/// The content region of `root`, appended as the last child when the
/// template marks none. Content is never rendered into the root itself, so
/// it cannot wipe out the close control.
fn content_region(document: &Document, root: ElementId, class_prefix: &str) -> ElementId {
    if let Some(content) = find_role(document, root, "content") {
        return content;
    }
    let content = document.create_element("div");
    document.add_class(content, &format!("{class_prefix}-content"));
    document.set_attr(content, "data-role", "content");
    document.append_child(root, content);
    tracing::debug!(element = %root, "template has no content region, added one");
    content
}

impl Dialog {
    /// Create a dialog on the global page.
    #[must_use]
    pub fn new(config: DialogConfig) -> Self {
        Self::with_page(config, &Page::global())
    }

    /// Create a dialog on `page`.
    ///
    /// The skeleton is materialised detached and hidden, and every configured
    /// attribute is applied to it; [`render`](Self::render) attaches it.
    #[must_use]
    pub fn with_page(config: DialogConfig, page: &Page) -> Self {
        let document = page.document().clone();
        let root = config.template.materialize(&document, &config.class_prefix);
        let content_element = content_region(&document, root, &config.class_prefix);
        let close_element = find_role(&document, root, "close");

        document.update_style(content_element, |s| s.height = Dimension::Percent(100.0));
        if let Some(close) = close_element {
            document.hide(close);
        }

        let mut overlay = Overlay::new(&document, root);
        overlay.hide();
        overlay.set_width(config.width);
        overlay.set_height(config.height);
        overlay.set_z_index(config.z_index);
        overlay.set_align(config.align);

        binder::make_tabbable(&document, root);
        let triggers = binder::resolve(&document, &config.trigger);
        for &trigger in &triggers {
            binder::make_tabbable(&document, trigger);
        }

        let id = overlay.id();
        let dialog = Self {
            inner: Rc::new(DialogInner {
                id,
                page: page.clone(),
                state: RefCell::new(State {
                    phase: Phase::Unrendered,
                    overlay,
                    content_element,
                    close_element,
                    class_prefix: config.class_prefix,
                    content: config.content,
                    trigger: config.trigger,
                    active_trigger: triggers.first().copied(),
                    triggers,
                    has_mask: config.has_mask,
                    hide_on_click_mask: config.hide_on_click_mask,
                    hide_on_key_escape: config.hide_on_key_escape,
                    close_tpl: config.close_tpl,
                    effect: config.effect,
                    load: LoadState::default(),
                }),
                hooks: RefCell::new(Hooks::default()),
                events: RefCell::new(Emitter::default()),
            }),
        };

        dialog.apply_close_tpl();
        dialog.apply_content();
        binder::bind_triggers(&dialog, &dialog.triggers());
        if let Some(close) = close_element {
            binder::bind_close(&dialog, close);
        }
        if config.hide_on_key_escape {
            binder::bind_escape(&dialog);
        }
        tracing::debug!(dialog = %id, element = %root, "dialog created");
        dialog
    }

    pub(crate) fn downgrade(&self) -> Weak<DialogInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<DialogInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    // --- Lifecycle ---

    /// Attach the skeleton to the page. Idempotent.
    pub fn render(&self) -> &Self {
        if self.rejected("render") || self.phase() != Phase::Unrendered {
            return self;
        }
        self.run_hooks(Lifecycle::Render, true);
        if self.is_destroyed() {
            return self;
        }
        {
            let mut state = self.inner.state.borrow_mut();
            state.overlay.attach();
            state.phase = Phase::Rendered;
        }
        tracing::debug!(dialog = %self.id(), "dialog rendered");
        self.run_hooks(Lifecycle::Render, false);
        self.emit(DialogEvent::Render);
        self
    }

    /// Show the dialog, starting a remote load first when the content is a
    /// URL.
    pub fn show(&self) -> &Self {
        if self.rejected("show") {
            return self;
        }
        let _span = tracing::debug_span!("dialog.show", dialog = %self.id()).entered();
        self.run_hooks(Lifecycle::Show, true);
        if self.is_destroyed() {
            return self;
        }
        self.start_load();
        if self.phase() == Phase::Unrendered {
            self.render();
        }
        if !self.is_visible() {
            self.apply_visible(true);
        }

        self.position();
        self.register_mask();
        self.document().focus(self.element());
        tracing::debug!(dialog = %self.id(), "dialog shown");

        self.run_hooks(Lifecycle::Show, false);
        self.emit(DialogEvent::Show);
        self
    }

    /// Hide the dialog and give focus back to the active trigger.
    pub fn hide(&self) -> &Self {
        if self.rejected("hide") {
            return self;
        }
        self.run_hooks(Lifecycle::Hide, true);
        if self.is_destroyed() {
            return self;
        }
        self.apply_visible(false);

        self.release_mask();
        let document = self.document();
        if let Some(trigger) = self.active_trigger()
            && document.is_alive(trigger)
        {
            document.focus(trigger);
        }
        tracing::debug!(dialog = %self.id(), "dialog hidden");

        self.run_hooks(Lifecycle::Hide, false);
        self.emit(DialogEvent::Hide);
        self
    }

    /// Remove the dialog from the page for good.
    pub fn destroy(&self) -> &Self {
        if self.rejected("destroy") {
            return self;
        }
        self.run_hooks(Lifecycle::Destroy, true);
        if self.is_destroyed() {
            return self;
        }
        binder::unbind_triggers(self, &self.triggers());
        binder::unbind_escape(self);
        let root = {
            let mut state = self.inner.state.borrow_mut();
            state.load.supersede();
            state.overlay.element()
        };
        self.document().remove(root);
        self.release_mask();
        {
            let mut state = self.inner.state.borrow_mut();
            state.phase = Phase::Destroyed;
            state.overlay.set_visible(false);
            state.active_trigger = None;
            state.triggers.clear();
        }
        tracing::debug!(dialog = %self.id(), "dialog destroyed");

        self.run_hooks(Lifecycle::Destroy, false);
        self.emit(DialogEvent::Destroy);
        self.inner.hooks.borrow_mut().clear();
        self.inner.events.borrow_mut().clear();
        self
    }

    // --- Attributes ---

    /// Change an attribute and run its side effect.
    pub fn set(&self, attr: Attr) -> &Self {
        if self.rejected("set") {
            return self;
        }
        tracing::trace!(dialog = %self.id(), attr = %attr.key(), "set");
        match attr {
            Attr::Content(content) => {
                {
                    let mut state = self.inner.state.borrow_mut();
                    state.content = content;
                    state.load.supersede();
                }
                self.apply_content();
            }
            Attr::Trigger(trigger) => self.retarget(trigger),
            Attr::ClassPrefix(prefix) => self.reclass(prefix),
            Attr::HasMask(on) => {
                let was = std::mem::replace(&mut self.inner.state.borrow_mut().has_mask, on);
                if self.is_visible() && was != on {
                    if on {
                        self.register_mask();
                    } else {
                        self.release_mask();
                    }
                }
            }
            Attr::HideOnClickMask(on) => {
                self.inner.state.borrow_mut().hide_on_click_mask = on;
                if let Some(mask) = self.inner.page.existing_mask()
                    && mask.contains(self.id())
                {
                    if on {
                        self.delegate_mask_click(&mask);
                    } else {
                        mask.undelegate(&self.id().to_string());
                    }
                }
            }
            Attr::HideOnKeyEscape(on) => {
                let was =
                    std::mem::replace(&mut self.inner.state.borrow_mut().hide_on_key_escape, on);
                if was != on {
                    if on {
                        binder::bind_escape(self);
                    } else {
                        binder::unbind_escape(self);
                    }
                }
            }
            Attr::CloseTpl(close_tpl) => {
                self.inner.state.borrow_mut().close_tpl = close_tpl;
                self.apply_close_tpl();
            }
            Attr::Width(width) => {
                self.inner.state.borrow_mut().overlay.set_width(width);
                self.reposition_if_visible();
            }
            Attr::Height(height) => {
                self.inner.state.borrow_mut().overlay.set_height(height);
                self.reposition_if_visible();
            }
            Attr::Effect(effect) => self.inner.state.borrow_mut().effect = effect,
            Attr::ZIndex(z_index) => {
                self.inner.state.borrow_mut().overlay.set_z_index(z_index);
                if let Some(mask) = self.inner.page.existing_mask()
                    && mask.top() == Some(self.id())
                {
                    mask.refresh();
                }
            }
            Attr::Align(align) => {
                self.inner.state.borrow_mut().overlay.set_align(align);
                self.reposition_if_visible();
            }
            Attr::Visible(true) => {
                self.show();
            }
            Attr::Visible(false) => {
                self.hide();
            }
        }
        self
    }

    /// Current value of an attribute.
    #[must_use]
    pub fn get(&self, key: AttrKey) -> Attr {
        let state = self.inner.state.borrow();
        match key {
            AttrKey::Content => Attr::Content(state.content.clone()),
            AttrKey::Trigger => Attr::Trigger(state.trigger.clone()),
            AttrKey::ClassPrefix => Attr::ClassPrefix(state.class_prefix.clone()),
            AttrKey::HasMask => Attr::HasMask(state.has_mask),
            AttrKey::HideOnClickMask => Attr::HideOnClickMask(state.hide_on_click_mask),
            AttrKey::HideOnKeyEscape => Attr::HideOnKeyEscape(state.hide_on_key_escape),
            AttrKey::CloseTpl => Attr::CloseTpl(state.close_tpl.clone()),
            AttrKey::Width => Attr::Width(state.overlay.width()),
            AttrKey::Height => Attr::Height(state.overlay.height()),
            AttrKey::Effect => Attr::Effect(state.effect.clone()),
            AttrKey::ZIndex => Attr::ZIndex(state.overlay.z_index()),
            AttrKey::Align => Attr::Align(state.overlay.effective_align()),
            AttrKey::Visible => Attr::Visible(state.overlay.is_visible()),
        }
    }

    // --- Hooks & events ---

    /// Run `f` before every `stage` transition.
    pub fn before(&self, stage: Lifecycle, f: impl Fn(&Dialog) + 'static) -> &Self {
        self.inner.hooks.borrow_mut().before(stage, Rc::new(f));
        self
    }

    /// Run `f` after every `stage` transition, following the built-ins.
    pub fn after(&self, stage: Lifecycle, f: impl Fn(&Dialog) + 'static) -> &Self {
        self.inner.hooks.borrow_mut().after(stage, Rc::new(f));
        self
    }

    /// Subscribe to `event`.
    pub fn on(&self, event: DialogEvent, f: impl Fn(&Dialog) + 'static) -> SubscriptionId {
        self.inner.events.borrow_mut().on(event, Rc::new(f))
    }

    /// Drop every subscriber to `event`.
    pub fn off(&self, event: DialogEvent) -> usize {
        self.inner.events.borrow_mut().off(event)
    }

    /// Drop one subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.borrow_mut().unsubscribe(id)
    }

    // --- Accessors ---

    #[must_use]
    pub fn id(&self) -> OverlayId {
        self.inner.id
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.inner.page
    }

    #[must_use]
    pub fn document(&self) -> Document {
        self.inner.page.document().clone()
    }

    /// The root element.
    #[must_use]
    pub fn element(&self) -> ElementId {
        self.inner.state.borrow().overlay.element()
    }

    #[must_use]
    pub fn content_element(&self) -> ElementId {
        self.inner.state.borrow().content_element
    }

    #[must_use]
    pub fn close_element(&self) -> Option<ElementId> {
        self.inner.state.borrow().close_element
    }

    /// The element that last opened the dialog; defaults to the first
    /// trigger.
    #[must_use]
    pub fn active_trigger(&self) -> Option<ElementId> {
        self.inner.state.borrow().active_trigger
    }

    pub(crate) fn set_active_trigger(&self, element: ElementId) {
        self.inner.state.borrow_mut().active_trigger = Some(element);
    }

    /// Trigger elements currently bound.
    #[must_use]
    pub fn triggers(&self) -> Vec<ElementId> {
        self.inner.state.borrow().triggers.clone()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.state.borrow().phase
    }

    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.phase() == Phase::Rendered
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.phase() == Phase::Destroyed
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.inner.state.borrow().overlay.is_visible()
    }

    /// Whether the content is a remote URL.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.inner.state.borrow().content.is_remote()
    }

    /// Whether a remote load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().load.is_pending()
    }

    #[must_use]
    pub fn has_mask(&self) -> bool {
        self.inner.state.borrow().has_mask
    }

    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.inner.state.borrow().overlay.z_index()
    }

    /// Alignment in effect right now (see [`Overlay::effective_align`]).
    #[must_use]
    pub fn align(&self) -> Align {
        self.inner.state.borrow().overlay.effective_align()
    }

    #[must_use]
    pub fn layout_stats(&self) -> LayoutStats {
        self.inner.state.borrow().overlay.layout_stats()
    }

    // --- Internals ---

    fn rejected(&self, operation: &'static str) -> bool {
        let destroyed = self.is_destroyed();
        if destroyed {
            tracing::warn!(dialog = %self.id(), operation, "operation on destroyed dialog ignored");
        }
        destroyed
    }

    fn run_hooks(&self, stage: Lifecycle, before: bool) {
        let callbacks = {
            let hooks = self.inner.hooks.borrow();
            if before {
                hooks.before_snapshot(stage)
            } else {
                hooks.after_snapshot(stage)
            }
        };
        for callback in callbacks {
            callback(self);
        }
    }

    fn emit(&self, event: DialogEvent) {
        let callbacks = self.inner.events.borrow().snapshot(event);
        for callback in callbacks {
            callback(self);
        }
    }

    fn position(&self) {
        self.inner.state.borrow_mut().overlay.set_position();
    }

    fn reposition_if_visible(&self) {
        if self.is_visible() {
            self.position();
        }
    }

    fn apply_visible(&self, visible: bool) {
        if !visible {
            self.inner.state.borrow_mut().overlay.hide();
            return;
        }
        let (effect, element) = {
            let mut state = self.inner.state.borrow_mut();
            state.overlay.set_visible(true);
            (state.effect.clone(), state.overlay.element())
        };
        match effect {
            Effect::None => self.document().show(element),
            Effect::Fade => self.document().fade_in(element, FADE_DURATION),
            Effect::Custom(f) => f(self, element),
        }
    }

    fn apply_close_tpl(&self) {
        let (close, close_tpl) = {
            let state = self.inner.state.borrow();
            (state.close_element, state.close_tpl.clone())
        };
        let Some(close) = close else {
            return;
        };
        let document = self.document();
        document.set_markup(close, &close_tpl);
        if close_tpl.is_empty() {
            document.hide(close);
        } else {
            document.show(close);
        }
    }

    fn apply_content(&self) {
        let (container, content) = {
            let state = self.inner.state.borrow();
            (state.content_element, state.content.clone())
        };
        if content.is_remote() {
            return;
        }
        content::render_inline(&self.document(), container, &content);
        self.position();
    }

    fn start_load(&self) {
        let (url, seq) = {
            let mut state = self.inner.state.borrow_mut();
            let Some(url) = state.content.as_str().filter(|v| is_remote_url(v)) else {
                return;
            };
            let url = url.to_owned();
            match state.load.begin(&url) {
                Some(seq) => (url, seq),
                None => {
                    tracing::debug!(dialog = %self.id(), %url, "load already in flight");
                    return;
                }
            }
        };
        let weak = self.downgrade();
        self.inner.page.fetcher().fetch(&url, move |outcome| {
            if let Some(dialog) = Dialog::upgrade(&weak) {
                dialog.complete_load(seq, outcome);
            }
        });
    }

    fn complete_load(&self, seq: u64, outcome: Result<String, LoadError>) {
        if self.is_destroyed() {
            tracing::debug!(dialog = %self.id(), "load completed after destroy; dropped");
            return;
        }
        let (finished, container) = {
            let mut state = self.inner.state.borrow_mut();
            (state.load.finish(seq), state.content_element)
        };
        if !finished {
            tracing::debug!(dialog = %self.id(), seq, "superseded load dropped");
            return;
        }
        match outcome {
            Ok(body) => self.document().set_markup(container, &body),
            Err(err) => tracing::warn!(
                dialog = %self.id(),
                url = err.url(),
                error = %err,
                "remote content failed to load"
            ),
        }
        if self.is_visible() {
            self.inner.state.borrow_mut().overlay.apply_height();
            self.position();
        }
        self.emit(DialogEvent::CompleteShow);
    }

    fn register_mask(&self) {
        let (has_mask, hide_on_click) = {
            let state = self.inner.state.borrow();
            (state.has_mask, state.hide_on_click_mask)
        };
        if !has_mask {
            return;
        }
        let mask = self.inner.page.mask();
        let entry: Rc<dyn Masked> = self.inner.clone();
        mask.register(&entry);
        if hide_on_click {
            self.delegate_mask_click(&mask);
        }
    }

    fn delegate_mask_click(&self, mask: &Mask) {
        let weak = self.downgrade();
        mask.delegate(
            &self.id().to_string(),
            Rc::new(move || {
                if let Some(dialog) = Dialog::upgrade(&weak) {
                    dialog.hide();
                }
            }),
        );
    }

    fn release_mask(&self) {
        if let Some(mask) = self.inner.page.existing_mask() {
            mask.release(self.id());
        }
    }

    fn retarget(&self, trigger: Trigger) {
        binder::unbind_triggers(self, &self.triggers());
        let document = self.document();
        let triggers = binder::resolve(&document, &trigger);
        for &element in &triggers {
            binder::make_tabbable(&document, element);
        }
        binder::bind_triggers(self, &triggers);
        let mut state = self.inner.state.borrow_mut();
        state.trigger = trigger;
        state.active_trigger = triggers.first().copied();
        state.triggers = triggers;
    }

    fn reclass(&self, prefix: String) {
        let (old, root, close, content) = {
            let mut state = self.inner.state.borrow_mut();
            let old = std::mem::replace(&mut state.class_prefix, prefix.clone());
            (
                old,
                state.overlay.element(),
                state.close_element,
                state.content_element,
            )
        };
        let document = self.document();
        let swap = |element: ElementId, suffix: &str| {
            document.remove_class(element, &format!("{old}{suffix}"));
            document.add_class(element, &format!("{prefix}{suffix}"));
        };
        swap(root, "");
        if let Some(close) = close {
            swap(close, "-close");
        }
        if content != root {
            swap(content, "-content");
        }
    }
}
