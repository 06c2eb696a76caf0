//! Integration tests: page edits through the undo/redo history.
//!
//! Exercises `Page` over a real `NodeTree`, checking that structural
//! edits and their undo leave both the flat node list and the child lists
//! exactly as they were.

use hocr_core::{NodeId, NodeKind, NodeRecord, Rect};
use hocr_editor::{NodeChange, Page, PageList};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;

fn rec(id: u32, parent: Option<u32>, kind: NodeKind, r: (f64, f64, f64, f64)) -> NodeRecord {
    NodeRecord {
        id: NodeId::new(id),
        parent: parent.map(NodeId::new),
        kind,
        bbox: Rect::new(r.0, r.1, r.2, r.3),
        text: None,
    }
}

fn word(id: u32, parent: u32, x: f64, text: &str) -> NodeRecord {
    NodeRecord {
        text: Some(text.to_string()),
        ..rec(id, Some(parent), NodeKind::Word, (x, 10.0, x + 20.0, 20.0))
    }
}

/// One paragraph with two lines: "a b c" and "d e".
fn make_page() -> Page {
    Page::from_records([
        rec(1, None, NodeKind::Page, (0.0, 0.0, 200.0, 200.0)),
        rec(2, Some(1), NodeKind::ContentArea, (0.0, 0.0, 200.0, 100.0)),
        rec(3, Some(2), NodeKind::Paragraph, (0.0, 0.0, 200.0, 100.0)),
        rec(4, Some(3), NodeKind::Line, (0.0, 10.0, 200.0, 20.0)),
        word(5, 4, 0.0, "a"),
        word(6, 4, 30.0, "b"),
        word(7, 4, 60.0, "c"),
        rec(8, Some(3), NodeKind::Line, (0.0, 30.0, 200.0, 40.0)),
        word(9, 8, 0.0, "d"),
        word(10, 8, 30.0, "e"),
    ])
    .unwrap()
}

fn ids(raw: &[u32]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId::new).collect()
}

fn children(page: &Page, id: u32) -> Vec<NodeId> {
    page.tree().children(NodeId::new(id)).to_vec()
}

// ─── Delete ─────────────────────────────────────────────────────────────

#[test]
fn deleting_a_selected_subtree_empties_the_selection() {
    let mut page = make_page();
    page.select_exclusive(&ids(&[8, 9, 10]));

    assert!(page.delete_nodes(&ids(&[8])));
    assert!(page.selected().is_empty());
    assert_eq!(page.nodes(), ids(&[1, 2, 3, 4, 5, 6, 7]).as_slice());
    assert_eq!(children(&page, 3), ids(&[4]));
}

#[test]
fn delete_keeps_unrelated_selection() {
    let mut page = make_page();
    page.select_exclusive(&ids(&[5, 9]));
    page.delete_nodes(&ids(&[9]));
    assert_eq!(page.selected(), ids(&[5]).as_slice());
}

#[test]
fn undo_delete_restores_lists_exactly() {
    let mut page = make_page();
    let nodes_before = page.nodes().to_vec();
    let children_before = children(&page, 4);

    page.delete_nodes(&ids(&[6, 4]));
    assert_eq!(page.nodes(), ids(&[1, 2, 3, 8, 9, 10]).as_slice());

    page.undo();
    assert_eq!(page.nodes(), nodes_before.as_slice());
    assert_eq!(children(&page, 4), children_before);
    assert_eq!(children(&page, 3), ids(&[4, 8]));

    page.redo();
    assert_eq!(page.nodes(), ids(&[1, 2, 3, 8, 9, 10]).as_slice());
}

// ─── Move ───────────────────────────────────────────────────────────────

#[test]
fn moving_words_between_lines_reparents_them() {
    let mut page = make_page();
    assert!(page.move_nodes(
        PageList::Children(NodeId::new(4)),
        PageList::Children(NodeId::new(8)),
        &ids(&[6, 7]),
        1,
    ));
    assert_eq!(children(&page, 4), ids(&[5]));
    assert_eq!(children(&page, 8), ids(&[9, 6, 7, 10]));
    assert_eq!(page.tree().parent(NodeId::new(6)), Some(NodeId::new(8)));
    assert_eq!(page.tree().parent(NodeId::new(7)), Some(NodeId::new(8)));

    assert_eq!(page.undo().as_deref(), Some("Move nodes"));
    assert_eq!(children(&page, 4), ids(&[5, 6, 7]));
    assert_eq!(children(&page, 8), ids(&[9, 10]));
    assert_eq!(page.tree().parent(NodeId::new(6)), Some(NodeId::new(4)));
}

#[test]
fn reorder_within_one_line() {
    let mut page = make_page();
    page.move_nodes(
        PageList::Children(NodeId::new(4)),
        PageList::Children(NodeId::new(4)),
        &ids(&[7]),
        0,
    );
    assert_eq!(children(&page, 4), ids(&[7, 5, 6]));
    assert_eq!(page.tree().parent(NodeId::new(7)), Some(NodeId::new(4)));

    page.undo();
    assert_eq!(children(&page, 4), ids(&[5, 6, 7]));
}

#[test]
fn moving_a_node_that_is_not_in_the_source_does_nothing() {
    let mut page = make_page();
    assert!(!page.move_nodes(
        PageList::Children(NodeId::new(4)),
        PageList::Children(NodeId::new(8)),
        &ids(&[9]),
        0,
    ));
    assert!(!page.can_undo());
}

// ─── Bounds ─────────────────────────────────────────────────────────────

#[test]
fn bounds_updates_share_the_history() {
    let mut page = make_page();
    let grow = NodeChange {
        id: NodeId::new(5),
        bounds: Rect::new(0.0, 10.0, 25.0, 20.0),
        previous: Rect::new(0.0, 10.0, 20.0, 20.0),
    };
    page.update_nodes(&[grow]);
    page.delete_nodes(&ids(&[10]));

    page.undo();
    assert_eq!(children(&page, 8), ids(&[9, 10]));
    assert_eq!(page.tree().get(NodeId::new(5)).unwrap().bbox, grow.bounds);

    page.undo();
    assert_eq!(page.tree().get(NodeId::new(5)).unwrap().bbox, grow.previous);
    assert!(!page.can_undo());
    assert!(page.can_redo());
}

#[test]
fn update_of_unknown_node_is_not_recorded() {
    let mut page = make_page();
    let ghost = NodeChange {
        id: NodeId::new(99),
        bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
        previous: Rect::ZERO,
    };
    assert!(!page.update_nodes(&[ghost]));
    assert!(!page.can_undo());
}

// ─── History ────────────────────────────────────────────────────────────

#[test]
fn history_changed_fires_until_unsubscribed() {
    let mut page = make_page();
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    let sub = page.on_history_changed(move || counter.set(counter.get() + 1));

    page.delete_nodes(&ids(&[5]));
    page.undo();
    page.redo();
    assert_eq!(fired.get(), 3);

    drop(sub);
    page.undo();
    assert_eq!(fired.get(), 3);
}

#[test]
fn history_depth_is_bounded() {
    let tree = hocr_core::NodeTree::build([
        rec(1, None, NodeKind::Page, (0.0, 0.0, 10.0, 10.0)),
        rec(2, Some(1), NodeKind::Image, (0.0, 0.0, 5.0, 5.0)),
    ])
    .unwrap();
    let mut page = Page::with_history_depth(tree, 2);
    for x in 1..=4 {
        let x = f64::from(x);
        page.update_nodes(&[NodeChange {
            id: NodeId::new(2),
            bounds: Rect::new(x, 0.0, 5.0, 5.0),
            previous: Rect::new(x - 1.0, 0.0, 5.0, 5.0),
        }]);
    }
    assert!(page.undo().is_some());
    assert!(page.undo().is_some());
    assert!(page.undo().is_none());
    assert_eq!(
        page.tree().get(NodeId::new(2)).unwrap().bbox,
        Rect::new(2.0, 0.0, 5.0, 5.0)
    );
}
