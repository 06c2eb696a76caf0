//! The page document: node tree, ordered node list, selection and history.
//!
//! Structural edits and committed bounds go through the undo history.
//! Selection changes do not.

use crate::canvas::NodeChange;
use crate::commands::{Command, CommandTarget, OrderedList, UndoRedoManager, plan_move};
use crate::error::EditorError;
use crate::events::Subscription;
use hocr_core::{NodeId, NodeRecord, NodeTree, Rect};

/// Lists a page command can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageList {
    /// Every live node of the page. Starts out in preorder, root first.
    Nodes,
    /// The child list of one node.
    Children(NodeId),
}

pub type PageCommand = Command<PageList, NodeId>;

/// Everything commands touch.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    tree: NodeTree,
    nodes: Vec<NodeId>,
    selected: Vec<NodeId>,
}

impl CommandTarget for PageState {
    type List = PageList;
    type Item = NodeId;

    fn list(&self, list: PageList) -> Option<&dyn OrderedList<NodeId>> {
        match list {
            PageList::Nodes => Some(&self.nodes),
            PageList::Children(parent) => self
                .tree
                .get(parent)
                .map(|n| &n.children as &dyn OrderedList<NodeId>),
        }
    }

    fn list_mut(&mut self, list: PageList) -> Option<&mut dyn OrderedList<NodeId>> {
        match list {
            PageList::Nodes => Some(&mut self.nodes),
            PageList::Children(parent) => self
                .tree
                .children_mut(parent)
                .map(|c| c as &mut dyn OrderedList<NodeId>),
        }
    }

    fn set_bounds(&mut self, id: NodeId, bounds: Rect) -> bool {
        self.tree.set_bbox(id, bounds)
    }

    fn item_inserted(&mut self, list: PageList, item: &NodeId) {
        if let PageList::Children(parent) = list {
            self.tree.set_parent(*item, Some(parent));
        }
    }

    fn item_removed(&mut self, list: PageList, item: &NodeId) {
        if list == PageList::Nodes {
            let tree = &self.tree;
            self.selected
                .retain(|s| s != item && !tree.is_ancestor_of(*item, *s));
        }
    }
}

/// One editable page.
#[derive(Debug)]
pub struct Page {
    state: PageState,
    history: UndoRedoManager<PageList, NodeId>,
}

impl Page {
    pub const DEFAULT_HISTORY_DEPTH: usize = 100;

    pub fn new(tree: NodeTree) -> Self {
        Self::with_history_depth(tree, Self::DEFAULT_HISTORY_DEPTH)
    }

    pub fn with_history_depth(tree: NodeTree, max_depth: usize) -> Self {
        let nodes = tree.preorder();
        Self {
            state: PageState {
                tree,
                nodes,
                selected: Vec::new(),
            },
            history: UndoRedoManager::new(max_depth),
        }
    }

    /// Build from preorder records.
    pub fn from_records<I>(records: I) -> Result<Self, EditorError>
    where
        I: IntoIterator<Item = NodeRecord>,
    {
        Ok(Self::new(NodeTree::build(records)?))
    }

    pub fn tree(&self) -> &NodeTree {
        &self.state.tree
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.state.nodes
    }

    pub fn next_id(&mut self) -> NodeId {
        self.state.tree.next_id()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selected(&self) -> &[NodeId] {
        &self.state.selected
    }

    /// Every listed node except the root.
    pub fn selectable_nodes(&self) -> Vec<NodeId> {
        let root = self.state.tree.root();
        self.state
            .nodes
            .iter()
            .filter(|id| Some(**id) != root)
            .copied()
            .collect()
    }

    /// Union of the selected nodes' bboxes.
    pub fn selection_bounds(&self) -> Rect {
        hocr_core::geom::union_all(
            self.state
                .selected
                .iter()
                .filter_map(|id| self.state.tree.get(*id))
                .map(|n| n.bbox),
        )
    }

    pub fn select_exclusive(&mut self, ids: &[NodeId]) {
        self.state.selected.clear();
        self.select_append(ids);
    }

    /// Add listed, non-root nodes that aren't selected yet.
    pub fn select_append(&mut self, ids: &[NodeId]) {
        let root = self.state.tree.root();
        for id in ids {
            if Some(*id) != root
                && self.state.nodes.contains(id)
                && !self.state.selected.contains(id)
            {
                self.state.selected.push(*id);
            }
        }
    }

    pub fn deselect(&mut self, ids: &[NodeId]) {
        self.state.selected.retain(|s| !ids.contains(s));
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Remove nodes with their subtrees, as one undo step.
    ///
    /// The root can't be deleted. A node whose ancestor is also listed
    /// goes with that ancestor.
    pub fn delete_nodes(&mut self, ids: &[NodeId]) -> bool {
        let tree = &self.state.tree;
        let roots: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| Some(*id) != tree.root() && tree.contains(*id))
            .filter(|id| !ids.iter().any(|other| tree.is_ancestor_of(*other, *id)))
            .collect();

        let mut commands = Vec::new();
        for id in &roots {
            if let Some(parent) = tree.parent(*id) {
                commands.push(PageCommand::remove(PageList::Children(parent), *id));
            }
            commands.push(PageCommand::remove(PageList::Nodes, *id));
            for descendant in tree.descendants(*id) {
                commands.push(PageCommand::remove(PageList::Nodes, descendant));
            }
        }
        log::debug!("delete {} nodes ({} subtrees)", ids.len(), roots.len());
        self.history
            .execute_transaction(&mut self.state, commands, "Delete nodes")
    }

    /// Move `ids` into `destination` before `insert_index`, as one undo step.
    ///
    /// Inserting into a node's child list makes that node the new parent.
    pub fn move_nodes(
        &mut self,
        source: PageList,
        destination: PageList,
        ids: &[NodeId],
        insert_index: usize,
    ) -> bool {
        if let PageList::Children(parent) = destination {
            let tree = &self.state.tree;
            if ids
                .iter()
                .any(|id| *id == parent || tree.is_ancestor_of(*id, parent))
            {
                log::debug!("refusing to move {ids:?} into their own subtree");
                return false;
            }
        }
        let commands = plan_move(&self.state, source, destination, ids, insert_index);
        self.history
            .execute_transaction(&mut self.state, commands, "Move nodes")
    }

    /// Commit a batch of bounds changes, as one undo step.
    pub fn update_nodes(&mut self, changes: &[NodeChange]) -> bool {
        let commands = changes
            .iter()
            .map(|c| PageCommand::set_bounds(c.id, c.bounds, c.previous))
            .collect();
        self.history
            .execute_transaction(&mut self.state, commands, "Update nodes")
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Option<String> {
        self.history.undo(&mut self.state)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.history.redo(&mut self.state)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use = "dropping the subscription unwires the listener"]
    pub fn on_history_changed(&self, listener: impl FnMut() + 'static) -> Subscription {
        self.history.on_stack_changed(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hocr_core::NodeKind;
    use pretty_assertions::assert_eq;

    fn rec(id: u32, parent: Option<u32>, kind: NodeKind, r: (f64, f64, f64, f64)) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(id),
            parent: parent.map(NodeId::new),
            kind,
            bbox: Rect::new(r.0, r.1, r.2, r.3),
            text: None,
        }
    }

    fn page() -> Page {
        Page::from_records([
            rec(1, None, NodeKind::Page, (0.0, 0.0, 100.0, 100.0)),
            rec(2, Some(1), NodeKind::Paragraph, (10.0, 10.0, 90.0, 40.0)),
            rec(3, Some(2), NodeKind::Line, (10.0, 10.0, 90.0, 20.0)),
            rec(4, Some(3), NodeKind::Word, (10.0, 10.0, 40.0, 20.0)),
            rec(5, Some(1), NodeKind::Paragraph, (10.0, 50.0, 90.0, 90.0)),
        ])
        .unwrap()
    }

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::new).collect()
    }

    #[test]
    fn root_is_never_selectable() {
        let mut p = page();
        p.select_exclusive(&ids(&[1, 2, 5, 2]));
        assert_eq!(p.selected(), ids(&[2, 5]).as_slice());
        assert_eq!(p.selectable_nodes(), ids(&[2, 3, 4, 5]));
        assert_eq!(p.selection_bounds(), Rect::new(10.0, 10.0, 90.0, 90.0));

        p.deselect(&ids(&[2]));
        assert_eq!(p.selected(), ids(&[5]).as_slice());
    }

    #[test]
    fn delete_cascades_selection_cleanup() {
        let mut p = page();
        p.select_exclusive(&ids(&[2, 3, 4]));
        assert!(p.delete_nodes(&ids(&[2])));
        assert!(p.selected().is_empty());
        assert_eq!(p.nodes(), ids(&[1, 5]).as_slice());
        assert_eq!(p.tree().children(NodeId::new(1)), ids(&[5]).as_slice());

        assert_eq!(p.undo().as_deref(), Some("Delete nodes"));
        assert_eq!(p.nodes(), ids(&[1, 2, 3, 4, 5]).as_slice());
        assert_eq!(p.tree().children(NodeId::new(1)), ids(&[2, 5]).as_slice());
    }

    #[test]
    fn root_cannot_be_deleted() {
        let mut p = page();
        assert!(!p.delete_nodes(&ids(&[1])));
        assert!(!p.can_undo());
    }

    #[test]
    fn update_nodes_is_undoable() {
        let mut p = page();
        let change = NodeChange {
            id: NodeId::new(5),
            bounds: Rect::new(12.0, 50.0, 90.0, 95.0),
            previous: Rect::new(10.0, 50.0, 90.0, 90.0),
        };
        assert!(p.update_nodes(&[change]));
        assert_eq!(p.tree().get(NodeId::new(5)).unwrap().bbox, change.bounds);
        p.undo();
        assert_eq!(p.tree().get(NodeId::new(5)).unwrap().bbox, change.previous);
        p.redo();
        assert_eq!(p.tree().get(NodeId::new(5)).unwrap().bbox, change.bounds);
    }

    #[test]
    fn cannot_move_into_own_subtree() {
        let mut p = page();
        assert!(!p.move_nodes(
            PageList::Children(NodeId::new(1)),
            PageList::Children(NodeId::new(3)),
            &ids(&[2]),
            0
        ));
    }

    #[test]
    fn next_id_never_reuses_deleted_ids() {
        let mut p = page();
        p.delete_nodes(&ids(&[5]));
        assert_eq!(p.next_id(), NodeId::new(6));
        assert_eq!(p.next_id(), NodeId::new(7));
    }
}
