//! Node tree model for a recognized page.
//!
//! Nodes live in a flat table keyed by `NodeId`. A parent lists its
//! children by id; a child points back at its parent by id. Nothing
//! holds a reference to another node, so the tree can be edited through
//! id lookups alone.
//!
//! A node's bbox is expected to contain its children and sit inside its
//! parent. The model does not enforce this: interactive resizing may
//! break it for a while and nothing here corrects it.

use crate::geom;
use crate::id::{IdAllocator, NodeId};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The region types that make up a recognized page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Page,
    ContentArea,
    Paragraph,
    Line,
    Header,
    Footer,
    TextFloat,
    Caption,
    Word,
    Image,
}

impl NodeKind {
    /// The kind that may directly contain this one. `None` for pages.
    pub const fn parent_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Page => None,
            NodeKind::ContentArea => Some(NodeKind::Page),
            NodeKind::Paragraph => Some(NodeKind::ContentArea),
            NodeKind::Line | NodeKind::Header | NodeKind::Footer => Some(NodeKind::Paragraph),
            NodeKind::TextFloat | NodeKind::Caption => Some(NodeKind::ContentArea),
            NodeKind::Word => Some(NodeKind::Line),
            NodeKind::Image => Some(NodeKind::Page),
        }
    }

    /// Whether a node of this kind may be placed directly under `parent`.
    pub fn can_nest_in(self, parent: NodeKind) -> bool {
        self.parent_kind() == Some(parent)
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A node as handed over by the document parser, in preorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub bbox: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub bbox: Rect,
    pub text: Option<String>,
    pub children: SmallVec<[NodeId; 4]>,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        Self {
            id: record.id,
            parent: record.parent,
            kind: record.kind,
            bbox: record.bbox,
            text: record.text,
            children: SmallVec::new(),
        }
    }
}

/// Structural errors raised while wiring a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {id} references parent {parent}, which has not been seen")]
    MissingParent { id: NodeId, parent: NodeId },
    #[error("node {0} appears twice")]
    DuplicateId(NodeId),
    #[error("node {id} has no parent but {root} is already the root")]
    MultipleRoots { id: NodeId, root: NodeId },
}

// ─── Tree ────────────────────────────────────────────────────────────────

/// Id-keyed node table with parent/child links stored as ids.
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    root: Option<NodeId>,
    ids: IdAllocator,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from records in preorder: every parent must appear
    /// before its children. Wiring is a single pass over the records.
    pub fn build<I>(records: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = NodeRecord>,
    {
        let mut tree = Self::new();
        for record in records {
            tree.insert(record)?;
        }
        log::debug!("built node tree with {} nodes", tree.len());
        Ok(tree)
    }

    /// Add one node, appending it to its parent's child list.
    pub fn insert(&mut self, record: NodeRecord) -> Result<NodeId, TreeError> {
        let id = record.id;
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        match record.parent {
            Some(parent) => {
                let parent_node = self
                    .nodes
                    .get_mut(&parent)
                    .ok_or(TreeError::MissingParent { id, parent })?;
                parent_node.children.push(id);
            }
            None => {
                if let Some(root) = self.root {
                    return Err(TreeError::MultipleRoots { id, root });
                }
                self.root = Some(id);
            }
        }
        self.ids.observe(id);
        self.nodes.insert(id, Node::from(record));
        Ok(id)
    }

    /// A fresh id, strictly greater than any id this tree has seen.
    pub fn next_id(&mut self) -> NodeId {
        self.ids.next()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_bounds(&self) -> Rect {
        self.root
            .and_then(|id| self.get(id))
            .map(|n| n.bbox)
            .unwrap_or(Rect::ZERO)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn children_mut(&mut self, id: NodeId) -> Option<&mut SmallVec<[NodeId; 4]>> {
        self.nodes.get_mut(&id).map(|n| &mut n.children)
    }

    /// Point `id` at a new parent. The caller owns the child-list edit.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.parent = parent;
                true
            }
            None => false,
        }
    }

    pub fn set_bbox(&mut self, id: NodeId, bbox: Rect) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.bbox = bbox;
                true
            }
            None => false,
        }
    }

    /// All descendants of `id` in preorder, not including `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// The root followed by every node reachable from it, in preorder.
    pub fn preorder(&self) -> Vec<NodeId> {
        match self.root {
            Some(root) => {
                let mut out = vec![root];
                out.extend(self.descendants(root));
                out
            }
            None => Vec::new(),
        }
    }

    /// Check if `ancestor` is a parent, grandparent, etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = self.parent(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Union of the bboxes of the children lying inside `id`'s bbox.
    ///
    /// This is how far a lone node may shrink before it stops enclosing
    /// its children. Empty when no child qualifies.
    pub fn contained_children_bounds(&self, id: NodeId) -> Rect {
        let Some(node) = self.get(id) else {
            return Rect::ZERO;
        };
        geom::union_all(
            node.children
                .iter()
                .filter_map(|c| self.get(*c))
                .map(|c| c.bbox)
                .filter(|bbox| geom::contains_rect(node.bbox, *bbox)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(id: u32, parent: Option<u32>, kind: NodeKind, bbox: (f64, f64, f64, f64)) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(id),
            parent: parent.map(NodeId::new),
            kind,
            bbox: Rect::new(bbox.0, bbox.1, bbox.2, bbox.3),
            text: None,
        }
    }

    fn sample() -> NodeTree {
        NodeTree::build([
            rec(0, None, NodeKind::Page, (0.0, 0.0, 1000.0, 1000.0)),
            rec(1, Some(0), NodeKind::ContentArea, (10.0, 10.0, 500.0, 500.0)),
            rec(2, Some(1), NodeKind::Paragraph, (20.0, 20.0, 400.0, 100.0)),
            rec(3, Some(2), NodeKind::Line, (30.0, 30.0, 300.0, 60.0)),
            rec(4, Some(1), NodeKind::Paragraph, (20.0, 200.0, 400.0, 300.0)),
            // Sticks out of its parent on purpose.
            rec(5, Some(1), NodeKind::Caption, (450.0, 450.0, 600.0, 600.0)),
        ])
        .unwrap()
    }

    #[test]
    fn build_wires_children_in_order() {
        let tree = sample();
        assert_eq!(tree.root(), Some(NodeId::new(0)));
        assert_eq!(
            tree.children(NodeId::new(1)),
            &[NodeId::new(2), NodeId::new(4), NodeId::new(5)]
        );
        assert_eq!(tree.parent(NodeId::new(3)), Some(NodeId::new(2)));
    }

    #[test]
    fn build_rejects_unknown_parent() {
        let err = NodeTree::build([
            rec(0, None, NodeKind::Page, (0.0, 0.0, 10.0, 10.0)),
            rec(2, Some(1), NodeKind::Word, (0.0, 0.0, 1.0, 1.0)),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TreeError::MissingParent {
                id: NodeId::new(2),
                parent: NodeId::new(1)
            }
        );
    }

    #[test]
    fn build_rejects_duplicates_and_second_root() {
        let dup = NodeTree::build([
            rec(0, None, NodeKind::Page, (0.0, 0.0, 10.0, 10.0)),
            rec(0, Some(0), NodeKind::Word, (0.0, 0.0, 1.0, 1.0)),
        ]);
        assert_eq!(dup.unwrap_err(), TreeError::DuplicateId(NodeId::new(0)));

        let roots = NodeTree::build([
            rec(0, None, NodeKind::Page, (0.0, 0.0, 10.0, 10.0)),
            rec(1, None, NodeKind::Page, (0.0, 0.0, 10.0, 10.0)),
        ]);
        assert!(matches!(roots, Err(TreeError::MultipleRoots { .. })));
    }

    #[test]
    fn next_id_continues_after_highest_seen() {
        let mut tree = sample();
        assert_eq!(tree.next_id(), NodeId::new(6));
        assert_eq!(tree.next_id(), NodeId::new(7));
    }

    #[test]
    fn descendants_are_preorder() {
        let tree = sample();
        assert_eq!(
            tree.descendants(NodeId::new(1)),
            vec![
                NodeId::new(2),
                NodeId::new(3),
                NodeId::new(4),
                NodeId::new(5)
            ]
        );
        assert_eq!(tree.preorder().len(), 6);
    }

    #[test]
    fn ancestry() {
        let tree = sample();
        assert!(tree.is_ancestor_of(NodeId::new(0), NodeId::new(3)));
        assert!(tree.is_ancestor_of(NodeId::new(2), NodeId::new(3)));
        assert!(!tree.is_ancestor_of(NodeId::new(3), NodeId::new(2)));
        assert!(!tree.is_ancestor_of(NodeId::new(4), NodeId::new(3)));
        assert!(!tree.is_ancestor_of(NodeId::new(2), NodeId::new(2)));
    }

    #[test]
    fn contained_children_skip_overhanging_child() {
        let tree = sample();
        assert_eq!(
            tree.contained_children_bounds(NodeId::new(1)),
            Rect::new(20.0, 20.0, 400.0, 300.0)
        );
        assert_eq!(tree.contained_children_bounds(NodeId::new(3)), Rect::ZERO);
    }

    #[test]
    fn parent_kinds_follow_hierarchy() {
        assert_eq!(NodeKind::Word.parent_kind(), Some(NodeKind::Line));
        assert_eq!(NodeKind::Page.parent_kind(), None);
        assert!(NodeKind::Caption.can_nest_in(NodeKind::ContentArea));
        assert!(!NodeKind::Word.can_nest_in(NodeKind::Paragraph));
    }

    #[test]
    fn record_json_shape() {
        let line = rec(3, Some(2), NodeKind::Line, (1.0, 2.0, 3.0, 4.0));
        let json = serde_json::to_value(line).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["parent"], 2);
        assert_eq!(json["kind"], "Line");
        assert!(json.get("text").is_none());
    }
}
