//! Screen-space projection of a page.
//!
//! The canvas keeps one `Element` per node: the node's committed bbox and
//! the visual bounds that drag and resize gestures edit live. Visual
//! bounds only reach the nodes when a gesture commits a `NodeChange`
//! batch and the host runs it through the page's history.

use crate::page::Page;
use crate::selection::CanvasSelection;
use hocr_core::{Affine, NodeId, NodeTree, Point, Rect, Vec2, geom};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Interaction tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionConfig {
    /// Side of the square hit area around each resize handle, in screen units.
    pub handle_size: f64,
    /// Arrow-key step multiplier with Ctrl held.
    pub nudge_ctrl_multiplier: f64,
    /// Arrow-key step multiplier with Ctrl+Shift held.
    pub nudge_ctrl_shift_multiplier: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            handle_size: 8.0,
            nudge_ctrl_multiplier: 5.0,
            nudge_ctrl_shift_multiplier: 10.0,
        }
    }
}

/// Pointer glyphs the canvas asks the host for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIcon {
    /// Whatever the active tool uses.
    #[default]
    Default,
    Move,
    ResizeNwse,
    ResizeNs,
    ResizeNesw,
    ResizeWe,
}

/// A committed bounds change for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeChange {
    pub id: NodeId,
    pub bounds: Rect,
    pub previous: Rect,
}

/// What the host should do after an input event.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEffect {
    SetCursor(CursorIcon),
    CapturePointer,
    ReleasePointer,
    Redraw,
    /// The selected node set changed.
    SelectionChanged(Vec<NodeId>),
    /// The committed selection rectangle changed.
    SelectionBounds(Rect),
    /// Bounds to commit as one undoable update.
    NodesChanged(Vec<NodeChange>),
}

/// A node as the canvas sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
    /// Committed node bbox at the last sync.
    pub bbox: Rect,
    /// Live bounds, edited during gestures.
    pub bounds: Rect,
}

#[derive(Debug, Clone, Default)]
pub struct Canvas {
    elements: HashMap<NodeId, Element>,
    /// Paint order; later elements are on top.
    order: Vec<NodeId>,
    root: Option<NodeId>,
    selected: Vec<NodeId>,
    selection_changed: bool,
    pub selection: CanvasSelection,
    /// Document to screen.
    transform: Affine,
    cursor: CursorIcon,
    selection_bounds: Rect,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild elements from the listed nodes of `tree`.
    ///
    /// Selected ids without an element are dropped.
    pub fn sync(&mut self, tree: &NodeTree, nodes: &[NodeId], selected: &[NodeId]) {
        self.elements.clear();
        self.order.clear();
        for node in nodes.iter().filter_map(|id| tree.get(*id)) {
            self.order.push(node.id);
            self.elements.insert(
                node.id,
                Element {
                    id: node.id,
                    parent: node.parent,
                    children: node.children.clone(),
                    bbox: node.bbox,
                    bounds: node.bbox,
                },
            );
        }
        self.root = tree.root().filter(|r| self.elements.contains_key(r));
        let previous = std::mem::take(&mut self.selected);
        self.selected = self.filter_selectable(selected);
        self.selection_changed |= previous != self.selected;
        self.update_selection();
    }

    pub fn sync_page(&mut self, page: &Page) {
        self.sync(page.tree(), page.nodes(), page.selected());
        self.selection_bounds = page.selection_bounds();
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn has_elements(&self) -> bool {
        !self.elements.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Bounds of the root element: the outermost drag and resize limit.
    pub fn root_bounds(&self) -> Rect {
        self.root
            .and_then(|id| self.element(id))
            .map(|e| e.bounds)
            .unwrap_or(Rect::ZERO)
    }

    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Selected nodes followed by their descendants, each once.
    pub fn selected_elements(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for id in &self.selected {
            let mut stack = vec![*id];
            while let Some(next) = stack.pop() {
                if out.contains(&next) {
                    continue;
                }
                let Some(element) = self.element(next) else {
                    continue;
                };
                out.push(next);
                stack.extend(element.children.iter().rev().copied());
            }
        }
        out
    }

    /// Replace the selection and re-fit the selection chrome to it.
    pub fn select(&mut self, ids: &[NodeId]) {
        let next = self.filter_selectable(ids);
        if next != self.selected {
            self.selected = next;
            self.selection_changed = true;
        }
        self.update_selection();
    }

    /// Add to the selection.
    pub fn select_append(&mut self, ids: &[NodeId]) {
        let mut next = self.selected.clone();
        next.extend_from_slice(ids);
        self.select(&next);
    }

    /// Report a selection change once.
    pub fn take_selection_change(&mut self) -> Option<Vec<NodeId>> {
        std::mem::take(&mut self.selection_changed).then(|| self.selected.clone())
    }

    fn filter_selectable(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if Some(*id) != self.root && self.elements.contains_key(id) && !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }

    /// Fit the selection rectangle around the selected elements.
    pub fn update_selection(&mut self) {
        let bounds = geom::union_all(
            self.selected
                .iter()
                .filter_map(|id| self.elements.get(id))
                .map(|e| e.bounds),
        );
        self.selection.set_bounds(bounds);
    }

    /// Whether selection chrome (and its handles) is shown.
    pub fn should_show_selection(&self) -> bool {
        !self.selected.is_empty() && !self.selection.is_empty()
    }

    /// Committed selection rectangle, e.g. a region picked for recognition.
    pub fn selection_bounds(&self) -> Rect {
        self.selection_bounds
    }

    pub fn set_selection_bounds(&mut self, bounds: Rect) {
        self.selection_bounds = bounds;
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    /// Screen point to document point.
    pub fn to_document(&self, position: Point) -> Point {
        self.transform.inverse() * position
    }

    /// Screen-space offset to document-space offset (ignores panning).
    pub fn delta_to_document(&self, delta: Vec2) -> Vec2 {
        let [a, b, c, d, _, _] = self.transform.as_coeffs();
        let scale_only = Affine::new([a, b, c, d, 0.0, 0.0]);
        (scale_only.inverse() * delta.to_point()).to_vec2()
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    /// Change the cursor. Returns an effect only if the glyph changed.
    pub fn set_cursor(&mut self, cursor: CursorIcon) -> Option<CanvasEffect> {
        if self.cursor == cursor {
            return None;
        }
        self.cursor = cursor;
        Some(CanvasEffect::SetCursor(cursor))
    }

    /// Topmost non-root element whose bounds contain the document point.
    pub fn hit_element(&self, point: Point) -> Option<NodeId> {
        self.order
            .iter()
            .rev()
            .filter(|id| Some(**id) != self.root)
            .find(|id| {
                self.elements
                    .get(id)
                    .is_some_and(|e| contains_point(e.bounds, point))
            })
            .copied()
    }

    /// Non-root elements lying entirely inside `rect`, in paint order.
    pub fn elements_within(&self, rect: Rect) -> Vec<NodeId> {
        self.order
            .iter()
            .filter(|id| Some(**id) != self.root)
            .filter(|id| {
                self.elements
                    .get(id)
                    .is_some_and(|e| geom::contains_rect(rect, e.bounds))
            })
            .copied()
            .collect()
    }

    /// Live bounds of each listed element.
    pub fn snapshot_bounds(&self, ids: &[NodeId]) -> Vec<(NodeId, Rect)> {
        ids.iter()
            .filter_map(|id| self.element(*id).map(|e| (*id, e.bounds)))
            .collect()
    }

    /// Compare current bounds with `start` and collect what moved.
    pub fn diff_bounds(&self, start: &[(NodeId, Rect)]) -> Vec<NodeChange> {
        start
            .iter()
            .filter_map(|(id, previous)| {
                let element = self.element(*id)?;
                (element.bounds != *previous).then_some(NodeChange {
                    id: *id,
                    bounds: element.bounds,
                    previous: *previous,
                })
            })
            .collect()
    }
}

/// Edges count as inside.
pub(crate) fn contains_point(rect: Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}
