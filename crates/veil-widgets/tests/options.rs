use std::rc::Rc;

use veil_core::{Dimension, Document, Size};
use veil_runtime::{Fetcher, StaticLoader, TaskQueue};
use veil_widgets::{Align, Attr, AttrKey, Dialog, DialogOptions, Effect, Page};

fn page() -> Page {
    Page::new(
        Document::new(Size::new(1024, 768)),
        Fetcher::new(Rc::new(StaticLoader::new()), TaskQueue::new()),
    )
}

#[test]
fn toml_options_build_a_working_dialog() {
    let page = page();
    let doc = page.document();
    let open = doc.create_element("a");
    doc.set_attr(open, "id", "open");
    doc.append_child(doc.body(), open);

    let options = DialogOptions::from_toml_str(
        r##"
        trigger = "#open"
        content = "<p>Are you sure?</p>"
        classPrefix = "confirm"
        hideOnClickMask = true
        width = "480px"
        zIndex = 1300
        effect = "none"
        "##,
    )
    .unwrap();
    let dialog = Dialog::with_page(options.into_config().unwrap(), &page);

    assert!(doc.has_class(dialog.element(), "confirm"));
    assert_eq!(dialog.get(AttrKey::Width), Attr::Width(Dimension::Px(480)));
    assert_eq!(dialog.get(AttrKey::Effect), Attr::Effect(Effect::None));

    doc.click(open);
    assert!(dialog.is_visible());
    assert_eq!(page.mask().z_index(), 1300);

    doc.click(page.mask().element());
    assert!(!dialog.is_visible());
    assert_eq!(doc.focused(), Some(open));
}

#[test]
fn json_template_is_used_for_the_skeleton() {
    let page = page();
    let doc = page.document();
    let options = DialogOptions::from_json_str(
        r#"{
            "template": "<section class=\"{{classPrefix}}\"><div class=\"{{classPrefix}}-body\" data-role=\"content\"></div></section>",
            "classPrefix": "sheet",
            "content": "hello"
        }"#,
    )
    .unwrap();
    let dialog = Dialog::with_page(options.into_config().unwrap(), &page);

    assert_eq!(doc.tag_name(dialog.element()).as_deref(), Some("section"));
    assert!(doc.has_class(dialog.content_element(), "sheet-body"));
    assert_eq!(dialog.close_element(), None);
    assert_eq!(doc.inner_text(dialog.content_element()), "hello");

    dialog.show();
    dialog.set(Attr::CloseTpl("x".into()));
    assert!(dialog.is_visible());
}

#[test]
fn pinned_alignment_round_trips_through_get() {
    let page = page();
    let options = DialogOptions::from_toml_str(
        r#"
        [align]
        selfXY = ["50%", "0"]
        baseXY = ["50%", "70px"]
        "#,
    )
    .unwrap();
    let dialog = Dialog::with_page(options.into_config().unwrap(), &page);
    assert_eq!(dialog.get(AttrKey::Align), Attr::Align(Align::PINNED_TOP));
    dialog.show();
    assert_eq!(page.document().rect(dialog.element()).y, 70);
}

#[test]
fn template_without_content_region_keeps_close_control() {
    let page = page();
    let doc = page.document();
    let options = DialogOptions::from_json_str(
        r#"{
            "template": "<div class=\"{{classPrefix}}\"><a class=\"{{classPrefix}}-close\" data-role=\"close\"></a></div>",
            "content": "hi"
        }"#,
    )
    .unwrap();
    let dialog = Dialog::with_page(options.into_config().unwrap(), &page);

    let content = dialog.content_element();
    assert_ne!(content, dialog.element());
    assert_eq!(doc.parent(content), Some(dialog.element()));
    assert!(doc.has_class(content, "ui-dialog-content"));
    assert_eq!(doc.inner_text(content), "hi");

    let close = dialog.close_element().unwrap();
    assert!(doc.is_alive(close));
    dialog.set(Attr::CloseTpl("x".into()));
    assert_eq!(doc.inner_text(close), "x");

    dialog.set(Attr::Content("<p>replaced</p>".into()));
    assert!(doc.is_alive(close));
    assert_eq!(doc.parent(close), Some(dialog.element()));
    dialog.show();
    doc.click(close);
    assert!(!dialog.is_visible());
}
