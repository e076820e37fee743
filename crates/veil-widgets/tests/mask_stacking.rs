use std::rc::Rc;

use proptest::prelude::*;
use veil_core::{Document, Size, Target};
use veil_runtime::{Fetcher, StaticLoader, TaskQueue};
use veil_widgets::{Attr, Dialog, DialogConfig, Page};

fn page() -> Page {
    Page::new(
        Document::new(Size::new(1024, 768)),
        Fetcher::new(Rc::new(StaticLoader::new()), TaskQueue::new()),
    )
}

fn dialog(page: &Page, z_index: i32) -> Dialog {
    Dialog::with_page(
        DialogConfig::new()
            .content(format!("<p>z{z_index}</p>"))
            .z_index(z_index),
        page,
    )
}

/// The mask sits directly beneath `dialog` and shares its z-index.
fn mask_under(page: &Page, dialog: &Dialog) -> bool {
    let mask = page.mask();
    let doc = page.document();
    mask.is_visible()
        && doc.previous_sibling(dialog.element()) == Some(mask.element())
        && mask.z_index() == dialog.z_index()
}

#[test]
fn mask_follows_most_recent_dialog() {
    let page = page();
    let a = dialog(&page, 1000);
    let b = dialog(&page, 900);

    a.show();
    assert!(mask_under(&page, &a));
    b.show();
    assert!(mask_under(&page, &b));
    assert_eq!(page.mask().stack(), vec![a.id(), b.id()]);

    b.hide();
    assert!(mask_under(&page, &a));
    a.hide();
    assert!(!page.mask().is_visible());
    assert_eq!(page.mask().depth(), 0);
}

#[test]
fn hiding_buried_dialog_leaves_mask_in_place() {
    let page = page();
    let a = dialog(&page, 999);
    let b = dialog(&page, 999);
    a.show();
    b.show();

    a.hide();
    assert!(mask_under(&page, &b));
    assert_eq!(page.mask().stack(), vec![b.id()]);
}

#[test]
fn destroying_top_keeps_mask_for_the_rest() {
    let page = page();
    let a = dialog(&page, 999);
    let b = dialog(&page, 1200);
    a.show();
    b.show();

    b.destroy();
    assert!(mask_under(&page, &a));
    assert!(!page.document().is_alive(b.element()));
}

#[test]
fn destroying_last_dialog_hides_mask() {
    let page = page();
    let a = dialog(&page, 999);
    a.show();
    a.destroy();
    assert!(!page.mask().is_visible());
    assert_eq!(page.mask().depth(), 0);
}

#[test]
fn unmasked_dialog_never_creates_mask() {
    let page = page();
    let a = Dialog::with_page(DialogConfig::new().has_mask(false), &page);
    a.show();
    a.hide();
    assert!(page.existing_mask().is_none());
}

#[test]
fn toggling_has_mask_while_visible() {
    let page = page();
    let a = dialog(&page, 999);
    a.show();
    a.set(Attr::HasMask(false));
    assert!(!page.mask().is_visible());

    a.set(Attr::HasMask(true));
    assert!(mask_under(&page, &a));

    a.set(Attr::HasMask(false));
    a.hide();
    a.set(Attr::HasMask(true));
    assert!(!page.mask().is_visible());
}

#[test]
fn repeated_show_registers_once() {
    let page = page();
    let a = Dialog::with_page(DialogConfig::new().hide_on_click_mask(true), &page);
    a.show();
    a.show();
    let mask = page.mask();
    assert_eq!(mask.depth(), 1);
    assert_eq!(
        page.document().listener_count(Target::Element(mask.element())),
        1
    );
}

#[test]
fn clicking_mask_hides_only_opted_in_dialog() {
    let page = page();
    let a = Dialog::with_page(DialogConfig::new().hide_on_click_mask(true), &page);
    let b = dialog(&page, 999);

    a.show();
    page.document().click(page.mask().element());
    assert!(!a.is_visible());

    b.show();
    page.document().click(page.mask().element());
    assert!(b.is_visible());

    b.set(Attr::HideOnClickMask(true));
    page.document().click(page.mask().element());
    assert!(!b.is_visible());
    assert!(!page.mask().is_visible());
}

#[test]
fn reshowing_buried_dialog_raises_it() {
    let page = page();
    let a = dialog(&page, 999);
    let b = dialog(&page, 999);
    a.show();
    b.show();
    a.show();
    assert_eq!(page.mask().stack(), vec![b.id(), a.id()]);
    assert!(mask_under(&page, &a));
}

#[test]
fn z_index_change_on_buried_dialog_does_not_move_mask() {
    let page = page();
    let a = dialog(&page, 999);
    let b = dialog(&page, 1100);
    a.show();
    b.show();
    a.set(Attr::ZIndex(5));
    assert_eq!(page.mask().z_index(), 1100);
    b.hide();
    assert_eq!(page.mask().z_index(), 5);
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Show(usize),
    Hide(usize),
    Destroy(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..3).prop_map(Op::Show),
        3 => (0usize..3).prop_map(Op::Hide),
        1 => (0usize..3).prop_map(Op::Destroy),
    ]
}

proptest! {
    #[test]
    fn mask_tracks_visible_dialogs(ops in prop::collection::vec(op(), 1..40)) {
        let page = page();
        let dialogs: Vec<Dialog> = (0..3).map(|i| dialog(&page, 900 + i)).collect();
        let mut expected: Vec<usize> = Vec::new();

        for op in ops {
            match op {
                Op::Show(i) => {
                    dialogs[i].show();
                    if !dialogs[i].is_destroyed() {
                        expected.retain(|&j| j != i);
                        expected.push(i);
                    }
                }
                Op::Hide(i) => {
                    dialogs[i].hide();
                    expected.retain(|&j| j != i);
                }
                Op::Destroy(i) => {
                    dialogs[i].destroy();
                    expected.retain(|&j| j != i);
                }
            }

            let mask = page.mask();
            let ids: Vec<_> = expected.iter().map(|&i| dialogs[i].id()).collect();
            prop_assert_eq!(mask.stack(), ids);
            prop_assert_eq!(mask.is_visible(), !expected.is_empty());
            if let Some(&top) = expected.last() {
                prop_assert!(mask_under(&page, &dialogs[top]));
            }
            for (i, d) in dialogs.iter().enumerate() {
                prop_assert_eq!(d.is_visible(), expected.contains(&i));
            }
        }
    }
}
