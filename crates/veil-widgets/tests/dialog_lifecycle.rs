use std::cell::{Cell, RefCell};
use std::rc::Rc;

use veil_core::{Document, KeyCode, Selector, Size};
use veil_runtime::{Fetcher, StaticLoader, TaskQueue};
use veil_widgets::dialog::FADE_DURATION;
use veil_widgets::{
    Attr, AttrKey, Dialog, DialogConfig, DialogEvent, Effect, Lifecycle, Page, Phase, Trigger,
};
use web_time::{Duration, Instant};

fn page() -> Page {
    Page::new(
        Document::new(Size::new(1024, 768)),
        Fetcher::new(Rc::new(StaticLoader::new()), TaskQueue::new()),
    )
}

fn button(page: &Page, id: &str) -> veil_core::ElementId {
    let doc = page.document();
    let el = doc.create_element("button");
    doc.set_attr(el, "id", id);
    doc.add_class(el, "open");
    doc.append_child(doc.body(), el);
    el
}

#[test]
fn visible_is_false_until_shown() {
    let page = page();
    let dialog = Dialog::with_page(DialogConfig::new(), &page);
    assert!(!dialog.is_visible());
    assert_eq!(dialog.get(AttrKey::Visible), Attr::Visible(false));

    dialog.show();
    assert!(dialog.is_visible());
    dialog.hide();
    assert!(!dialog.is_visible());
    assert!(!page.document().is_displayed(dialog.element()));
}

#[test]
fn render_attaches_once() {
    let page = page();
    let renders = Rc::new(Cell::new(0));
    let dialog = Dialog::with_page(DialogConfig::new(), &page);
    let r = Rc::clone(&renders);
    dialog.on(DialogEvent::Render, move |_| r.set(r.get() + 1));

    dialog.render().render();
    dialog.show();
    assert_eq!(renders.get(), 1);
    assert_eq!(dialog.phase(), Phase::Rendered);
    assert_eq!(
        page.document().parent(dialog.element()),
        Some(page.document().body())
    );
}

#[test]
fn trigger_click_shows_and_records_trigger() {
    let page = page();
    let first = button(&page, "first");
    let second = button(&page, "second");
    let selector = Selector::parse(".open").unwrap();
    let dialog = Dialog::with_page(DialogConfig::new().trigger(selector), &page);

    assert_eq!(dialog.triggers(), vec![first, second]);
    assert_eq!(dialog.active_trigger(), Some(first));
    assert_eq!(page.document().attr(second, "tabindex").as_deref(), Some("-1"));

    page.document().click(second);
    assert!(dialog.is_visible());
    assert_eq!(dialog.active_trigger(), Some(second));
    assert_eq!(page.document().focused(), Some(dialog.element()));

    dialog.hide();
    assert_eq!(page.document().focused(), Some(second));
}

#[test]
fn existing_tabindex_is_kept() {
    let page = page();
    let open = button(&page, "open");
    page.document().set_attr(open, "tabindex", "0");
    let dialog = Dialog::with_page(DialogConfig::new().trigger(open), &page);
    assert_eq!(page.document().attr(open, "tabindex").as_deref(), Some("0"));
    assert_eq!(dialog.triggers(), vec![open]);
}

#[test]
fn retargeting_moves_click_bindings() {
    let page = page();
    let old = button(&page, "old");
    let new = button(&page, "new");
    let dialog = Dialog::with_page(DialogConfig::new().trigger(old), &page);

    dialog.set(Attr::Trigger(Trigger::from(new)));
    page.document().click(old);
    assert!(!dialog.is_visible());
    page.document().click(new);
    assert!(dialog.is_visible());
    assert_eq!(dialog.active_trigger(), Some(new));
}

#[test]
fn close_control_hides() {
    let page = page();
    let dialog = Dialog::with_page(DialogConfig::new(), &page);
    dialog.show();
    let close = dialog.close_element().unwrap();
    assert!(page.document().is_displayed(close));
    page.document().click(close);
    assert!(!dialog.is_visible());
}

#[test]
fn escape_release_hides_visible_dialog() {
    let page = page();
    let dialog = Dialog::with_page(DialogConfig::new(), &page);
    dialog.show();

    page.document().key_down(None, KeyCode::Escape);
    assert!(dialog.is_visible());
    page.document().key_up(None, KeyCode::Escape);
    assert!(!dialog.is_visible());

    let hides = Rc::new(Cell::new(0));
    let h = Rc::clone(&hides);
    dialog.on(DialogEvent::Hide, move |_| h.set(h.get() + 1));
    page.document().key_press(None, KeyCode::Escape);
    assert_eq!(hides.get(), 0);
}

#[test]
fn escape_can_be_disabled() {
    let page = page();
    let dialog = Dialog::with_page(DialogConfig::new().hide_on_key_escape(false), &page);
    dialog.show();
    page.document().key_press(None, KeyCode::Escape);
    assert!(dialog.is_visible());
    page.document().key_press(None, KeyCode::Enter);
    assert!(dialog.is_visible());
}

#[test]
fn empty_close_template_hides_control() {
    let page = page();
    let doc = page.document();
    let dialog = Dialog::with_page(DialogConfig::new().close_tpl(""), &page);
    let close = dialog.close_element().unwrap();
    dialog.show();
    assert!(!doc.is_displayed(close));

    dialog.set(Attr::CloseTpl("Close".into()));
    assert!(doc.is_displayed(close));
    assert_eq!(doc.inner_text(close), "Close");

    dialog.set(Attr::CloseTpl(String::new()));
    assert!(!doc.is_displayed(close));
}

#[test]
fn close_template_applies_before_first_show() {
    let page = page();
    let dialog = Dialog::with_page(DialogConfig::new(), &page);
    dialog.set(Attr::CloseTpl("x".into()));
    assert_eq!(page.document().inner_text(dialog.close_element().unwrap()), "x");
}

#[test]
fn fade_effect_animates_opacity() {
    let page = page();
    let doc = page.document();
    let dialog = Dialog::with_page(DialogConfig::new().effect(Effect::Fade), &page);
    let before = Instant::now();
    dialog.show();
    assert!(dialog.is_visible());
    assert!(doc.is_displayed(dialog.element()));

    let fade = doc.style(dialog.element()).fade.unwrap();
    assert_eq!(fade.duration, FADE_DURATION);
    assert!(fade.started >= before);
    let opacity = doc.opacity(dialog.element());
    assert!((0.0..=1.0).contains(&opacity));
    assert_eq!(fade.opacity_at(fade.started + Duration::from_secs(1)), 1.0);
}

#[test]
fn custom_effect_replaces_display() {
    let page = page();
    let calls = Rc::new(Cell::new(0));
    let c = Rc::clone(&calls);
    let dialog = Dialog::with_page(
        DialogConfig::new().effect(Effect::custom(move |dialog, element| {
            c.set(c.get() + 1);
            dialog.document().show(element);
        })),
        &page,
    );
    dialog.show();
    dialog.show();
    assert_eq!(calls.get(), 1);
}

#[test]
fn hooks_wrap_each_transition() {
    let page = page();
    let dialog = Dialog::with_page(DialogConfig::new(), &page);
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    for stage in Lifecycle::ALL {
        let l = Rc::clone(&log);
        dialog.before(stage, move |_| l.borrow_mut().push(format!("before {stage}")));
        let l = Rc::clone(&log);
        dialog.after(stage, move |_| l.borrow_mut().push(format!("after {stage}")));
    }

    dialog.show();
    dialog.hide();
    dialog.destroy();
    assert_eq!(
        *log.borrow(),
        vec![
            "before show",
            "before render",
            "after render",
            "after show",
            "before hide",
            "after hide",
            "before destroy",
            "after destroy",
        ]
    );
}

#[test]
fn after_hide_sees_focus_returned() {
    let page = page();
    let open = button(&page, "open");
    let dialog = Dialog::with_page(DialogConfig::new().trigger(open), &page);
    let focused = Rc::new(Cell::new(None));
    let f = Rc::clone(&focused);
    dialog.after(Lifecycle::Hide, move |d| f.set(d.document().focused()));

    page.document().click(open);
    dialog.hide();
    assert_eq!(focused.get(), Some(open));
}

#[test]
fn unsubscribed_listeners_stop_firing() {
    let page = page();
    let dialog = Dialog::with_page(DialogConfig::new(), &page);
    let shows = Rc::new(Cell::new(0));
    let s = Rc::clone(&shows);
    let id = dialog.on(DialogEvent::Show, move |_| s.set(s.get() + 1));
    dialog.show();
    assert!(dialog.unsubscribe(id));
    dialog.show();
    assert_eq!(shows.get(), 1);
}

#[test]
fn destroy_is_terminal() {
    let page = page();
    let open = button(&page, "open");
    let dialog = Dialog::with_page(DialogConfig::new().trigger(open), &page);
    dialog.show();
    let root = dialog.element();

    dialog.destroy();
    assert!(dialog.is_destroyed());
    assert!(!page.document().is_alive(root));

    page.document().click(open);
    dialog.show().hide().destroy();
    assert!(!dialog.is_visible());
    page.document().key_press(None, KeyCode::Escape);
    assert!(dialog.is_destroyed());
}

#[test]
fn width_and_align_reposition_visible_dialog() {
    let page = page();
    let dialog = Dialog::with_page(DialogConfig::new(), &page);
    dialog.show();
    let passes = dialog.layout_stats().position_passes;

    dialog.set(Attr::Width(veil_core::Dimension::Px(400)));
    assert_eq!(dialog.layout_stats().position_passes, passes + 1);
    let rect = page.document().rect(dialog.element());
    assert_eq!(rect.width, 400);
    assert_eq!(rect.x, (1024 - 400) / 2);
}
