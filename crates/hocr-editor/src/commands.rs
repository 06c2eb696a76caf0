//! Undo/Redo over ordered collections.
//!
//! A `Command` is a reversible edit of one ordered list (insert, remove,
//! move) or a committed bounds change of one node. Commands are executed
//! in groups: a `Transaction` is applied front to back and undone back to
//! front, and counts as a single undo step.
//!
//! Commands never hold on to the lists they edit. They name a list by id
//! and a `CommandTarget` resolves the id when the command runs, so the
//! history can outlive any borrow of the document.

use crate::events::{Event, Subscription};
use hocr_core::{NodeId, Rect};
use smallvec::SmallVec;
use std::fmt;

// ─── Ordered lists ───────────────────────────────────────────────────────

/// The list operations commands need.
pub trait OrderedList<T> {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&T>;

    fn index_of(&self, item: &T) -> Option<usize>;

    /// Insert at `index`, which must be `<= len()`.
    fn insert_at(&mut self, index: usize, item: T);

    /// Remove at `index`, which must be `< len()`.
    fn remove_at(&mut self, index: usize) -> T;

    /// Copy of the current contents, in order.
    fn snapshot(&self) -> Vec<T>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the item at `from` out and put it back at `to`.
    fn move_item(&mut self, from: usize, to: usize) {
        let item = self.remove_at(from);
        self.insert_at(to, item);
    }
}

impl<T: Clone + PartialEq> OrderedList<T> for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn index_of(&self, item: &T) -> Option<usize> {
        self.iter().position(|x| x == item)
    }

    fn insert_at(&mut self, index: usize, item: T) {
        self.insert(index, item);
    }

    fn remove_at(&mut self, index: usize) -> T {
        self.remove(index)
    }

    fn snapshot(&self) -> Vec<T> {
        self.clone()
    }
}

impl<A> OrderedList<A::Item> for SmallVec<A>
where
    A: smallvec::Array,
    A::Item: Clone + PartialEq,
{
    fn len(&self) -> usize {
        SmallVec::len(self)
    }

    fn get(&self, index: usize) -> Option<&A::Item> {
        self.as_slice().get(index)
    }

    fn index_of(&self, item: &A::Item) -> Option<usize> {
        self.iter().position(|x| x == item)
    }

    fn insert_at(&mut self, index: usize, item: A::Item) {
        self.insert(index, item);
    }

    fn remove_at(&mut self, index: usize) -> A::Item {
        self.remove(index)
    }

    fn snapshot(&self) -> Vec<A::Item> {
        self.to_vec()
    }
}

// ─── Targets ─────────────────────────────────────────────────────────────

/// Whatever owns the lists (and node bounds) that commands edit.
pub trait CommandTarget {
    /// Names one of the target's lists.
    type List: Copy + Eq + fmt::Debug;
    type Item: Clone + PartialEq + fmt::Debug;

    fn list(&self, list: Self::List) -> Option<&dyn OrderedList<Self::Item>>;

    fn list_mut(&mut self, list: Self::List) -> Option<&mut dyn OrderedList<Self::Item>>;

    /// Store committed bounds for a node. Returns false if there is no such node.
    fn set_bounds(&mut self, _id: NodeId, _bounds: Rect) -> bool {
        false
    }

    /// Called after `item` was put into `list`.
    fn item_inserted(&mut self, _list: Self::List, _item: &Self::Item) {}

    /// Called after `item` was taken out of `list`.
    fn item_removed(&mut self, _list: Self::List, _item: &Self::Item) {}
}

// ─── Commands ────────────────────────────────────────────────────────────

/// One reversible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command<L, T> {
    /// Put `item` at `index` (clamped to the list length).
    Insert { list: L, item: T, index: usize },
    /// Take `item` out of `list`. `index` is filled in when the command
    /// runs so undo can put the item back where it was.
    Remove {
        list: L,
        item: T,
        index: Option<usize>,
    },
    /// Reorder within one list.
    Move { list: L, from: usize, to: usize },
    /// Replace a node's committed bounds.
    SetBounds {
        id: NodeId,
        bounds: Rect,
        previous: Rect,
    },
}

impl<L, T> Command<L, T>
where
    L: Copy + Eq + fmt::Debug,
    T: Clone + PartialEq + fmt::Debug,
{
    pub fn insert(list: L, item: T, index: usize) -> Self {
        Command::Insert { list, item, index }
    }

    pub fn remove(list: L, item: T) -> Self {
        Command::Remove {
            list,
            item,
            index: None,
        }
    }

    pub fn move_item(list: L, from: usize, to: usize) -> Self {
        Command::Move { list, from, to }
    }

    pub fn set_bounds(id: NodeId, bounds: Rect, previous: Rect) -> Self {
        Command::SetBounds {
            id,
            bounds,
            previous,
        }
    }

    /// Run the forward edit. Returns false (and changes nothing) when the
    /// command doesn't apply, e.g. the item isn't in the list.
    pub fn apply<G>(&mut self, target: &mut G) -> bool
    where
        G: CommandTarget<List = L, Item = T>,
    {
        match self {
            Command::Insert { list, item, index } => {
                let Some(items) = target.list_mut(*list) else {
                    return false;
                };
                let at = (*index).min(items.len());
                items.insert_at(at, item.clone());
                target.item_inserted(*list, item);
                true
            }
            Command::Remove { list, item, index } => {
                let Some(items) = target.list_mut(*list) else {
                    return false;
                };
                let Some(at) = items.index_of(item) else {
                    log::trace!("skip remove: {item:?} not in {list:?}");
                    return false;
                };
                items.remove_at(at);
                *index = Some(at);
                target.item_removed(*list, item);
                true
            }
            Command::Move { list, from, to } => {
                let Some(items) = target.list_mut(*list) else {
                    return false;
                };
                if *from >= items.len() || *to >= items.len() {
                    log::trace!("skip move {from} -> {to} in {list:?}: out of range");
                    return false;
                }
                items.move_item(*from, *to);
                true
            }
            Command::SetBounds { id, bounds, .. } => target.set_bounds(*id, *bounds),
        }
    }

    /// Undo a previously applied forward edit.
    pub fn revert<G>(&mut self, target: &mut G) -> bool
    where
        G: CommandTarget<List = L, Item = T>,
    {
        match self {
            Command::Insert { list, item, index } => {
                let Some(items) = target.list_mut(*list) else {
                    return false;
                };
                let at = match items.get(*index) {
                    Some(found) if *found == *item => Some(*index),
                    _ => items.index_of(item),
                };
                let Some(at) = at else {
                    return false;
                };
                items.remove_at(at);
                target.item_removed(*list, item);
                true
            }
            Command::Remove { list, item, index } => {
                let Some(at) = *index else {
                    return false;
                };
                let Some(items) = target.list_mut(*list) else {
                    return false;
                };
                let at = at.min(items.len());
                items.insert_at(at, item.clone());
                target.item_inserted(*list, item);
                true
            }
            Command::Move { list, from, to } => {
                let Some(items) = target.list_mut(*list) else {
                    return false;
                };
                if *from >= items.len() || *to >= items.len() {
                    return false;
                }
                items.move_item(*to, *from);
                true
            }
            Command::SetBounds { id, previous, .. } => target.set_bounds(*id, *previous),
        }
    }
}

/// Commands that undo and redo together.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction<L, T> {
    pub description: String,
    pub commands: Vec<Command<L, T>>,
}

/// Build the commands that move `items` into `destination`, each placed
/// before the item currently at `insert_index`.
///
/// Within one list this is a series of `Move`s. The insertion point is
/// corrected per item: taking an item out from before the insertion
/// point shifts that point down by one, and every placed item pushes the
/// next one further along. Across lists it is `Remove`s from `source`
/// followed by `Insert`s into `destination`. Items missing from the
/// source are skipped.
pub fn plan_move<G>(
    target: &G,
    source: G::List,
    destination: G::List,
    items: &[G::Item],
    insert_index: usize,
) -> Vec<Command<G::List, G::Item>>
where
    G: CommandTarget,
{
    let Some(dest_items) = target.list(destination).map(|l| l.snapshot()) else {
        return Vec::new();
    };
    let mut commands = Vec::new();

    if source == destination {
        let mut scratch = dest_items;
        let mut insert = insert_index.min(scratch.len());
        for item in items {
            let Some(index) = scratch.index_of(item) else {
                continue;
            };
            if index < insert {
                insert -= 1;
            }
            let to = insert.min(scratch.len() - 1);
            if index != to {
                scratch.move_item(index, to);
                commands.push(Command::move_item(destination, index, to));
            }
            insert = to + 1;
        }
        return commands;
    }

    let Some(source_items) = target.list(source).map(|l| l.snapshot()) else {
        return Vec::new();
    };
    let moving: Vec<&G::Item> = items.iter().filter(|i| source_items.contains(i)).collect();
    for item in &moving {
        commands.push(Command::remove(source, (*item).clone()));
    }
    let mut insert = insert_index.min(dest_items.len());
    for item in moving {
        commands.push(Command::insert(destination, item.clone(), insert));
        insert += 1;
    }
    commands
}

// ─── History ─────────────────────────────────────────────────────────────

/// Linear undo/redo history of transactions.
pub struct UndoRedoManager<L, T> {
    undo_stack: Vec<Transaction<L, T>>,
    redo_stack: Vec<Transaction<L, T>>,
    /// Maximum undo depth.
    max_depth: usize,
    stack_changed: Event,
}

impl<L, T> UndoRedoManager<L, T>
where
    L: Copy + Eq + fmt::Debug,
    T: Clone + PartialEq + fmt::Debug,
{
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
            stack_changed: Event::new(),
        }
    }

    /// Execute one command as its own undo step.
    pub fn execute<G>(&mut self, target: &mut G, command: Command<L, T>, description: &str) -> bool
    where
        G: CommandTarget<List = L, Item = T>,
    {
        self.execute_transaction(target, vec![command], description)
    }

    /// Execute `commands` in order as one undo step.
    ///
    /// Commands that don't apply are skipped and left out of the step.
    /// If none apply, nothing is recorded and the redo history survives.
    pub fn execute_transaction<G>(
        &mut self,
        target: &mut G,
        commands: Vec<Command<L, T>>,
        description: &str,
    ) -> bool
    where
        G: CommandTarget<List = L, Item = T>,
    {
        let total = commands.len();
        let mut applied = Vec::with_capacity(total);
        for mut command in commands {
            if command.apply(target) {
                applied.push(command);
            }
        }
        if applied.is_empty() {
            log::debug!("{description}: nothing to record ({total} commands skipped)");
            return false;
        }
        log::debug!("{description}: applied {}/{total} commands", applied.len());

        self.undo_stack.push(Transaction {
            description: description.to_string(),
            commands: applied,
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        self.stack_changed.emit();
        true
    }

    /// Undo the last transaction. Returns its description.
    pub fn undo<G>(&mut self, target: &mut G) -> Option<String>
    where
        G: CommandTarget<List = L, Item = T>,
    {
        let mut transaction = self.undo_stack.pop()?;
        for command in transaction.commands.iter_mut().rev() {
            command.revert(target);
        }
        log::debug!("undo: {}", transaction.description);
        let description = transaction.description.clone();
        self.redo_stack.push(transaction);
        self.stack_changed.emit();
        Some(description)
    }

    /// Redo the last undone transaction. Returns its description.
    pub fn redo<G>(&mut self, target: &mut G) -> Option<String>
    where
        G: CommandTarget<List = L, Item = T>,
    {
        let mut transaction = self.redo_stack.pop()?;
        for command in transaction.commands.iter_mut() {
            command.apply(target);
        }
        log::debug!("redo: {}", transaction.description);
        let description = transaction.description.clone();
        self.undo_stack.push(transaction);
        self.stack_changed.emit();
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get notified after every push or pop of either stack.
    #[must_use = "dropping the subscription unwires the listener"]
    pub fn on_stack_changed(&self, listener: impl FnMut() + 'static) -> Subscription {
        self.stack_changed.subscribe(listener)
    }
}

impl<L, T> fmt::Debug for UndoRedoManager<L, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoRedoManager")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shelf {
        A,
        B,
    }

    #[derive(Default)]
    struct Shelves {
        a: Vec<char>,
        b: Vec<char>,
    }

    impl CommandTarget for Shelves {
        type List = Shelf;
        type Item = char;

        fn list(&self, list: Shelf) -> Option<&dyn OrderedList<char>> {
            Some(match list {
                Shelf::A => &self.a,
                Shelf::B => &self.b,
            })
        }

        fn list_mut(&mut self, list: Shelf) -> Option<&mut dyn OrderedList<char>> {
            Some(match list {
                Shelf::A => &mut self.a,
                Shelf::B => &mut self.b,
            })
        }
    }

    fn shelves(a: &str, b: &str) -> Shelves {
        Shelves {
            a: a.chars().collect(),
            b: b.chars().collect(),
        }
    }

    fn text(list: &[char]) -> String {
        list.iter().collect()
    }

    #[test]
    fn move_within_list_corrects_index() {
        let mut t = shelves("abcde", "");
        let mut history = UndoRedoManager::new(100);

        let cmds = plan_move(&t, Shelf::A, Shelf::A, &['d'], 1);
        assert_eq!(cmds, vec![Command::move_item(Shelf::A, 3, 1)]);
        history.execute_transaction(&mut t, cmds, "move d");
        assert_eq!(text(&t.a), "adbce");

        // `d` sits before the insertion point, so the point shifts down.
        let cmds = plan_move(&t, Shelf::A, Shelf::A, &['d'], 4);
        assert_eq!(cmds, vec![Command::move_item(Shelf::A, 1, 3)]);
        history.execute_transaction(&mut t, cmds, "move d back");
        assert_eq!(text(&t.a), "abcde");
    }

    #[test]
    fn move_several_items_keeps_their_order() {
        let mut t = shelves("abcde", "");
        let mut history = UndoRedoManager::new(100);

        let cmds = plan_move(&t, Shelf::A, Shelf::A, &['a', 'b'], 5);
        history.execute_transaction(&mut t, cmds, "to end");
        assert_eq!(text(&t.a), "cdeab");

        history.undo(&mut t);
        assert_eq!(text(&t.a), "abcde");
    }

    #[test]
    fn move_to_end_of_list() {
        let mut t = shelves("abc", "");
        let mut history = UndoRedoManager::new(100);
        let cmds = plan_move(&t, Shelf::A, Shelf::A, &['a'], 3);
        history.execute_transaction(&mut t, cmds, "to end");
        assert_eq!(text(&t.a), "bca");
    }

    #[test]
    fn cross_list_move_and_undo() {
        let mut t = shelves("xy", "pq");
        let mut history = UndoRedoManager::new(100);

        let cmds = plan_move(&t, Shelf::A, Shelf::B, &['x'], 1);
        assert_eq!(
            cmds,
            vec![Command::remove(Shelf::A, 'x'), Command::insert(Shelf::B, 'x', 1)]
        );
        assert!(history.execute_transaction(&mut t, cmds, "move x"));
        assert_eq!((text(&t.a), text(&t.b)), ("y".into(), "pxq".into()));

        history.undo(&mut t);
        assert_eq!((text(&t.a), text(&t.b)), ("xy".into(), "pq".into()));

        history.redo(&mut t);
        assert_eq!((text(&t.a), text(&t.b)), ("y".into(), "pxq".into()));
    }

    #[test]
    fn cross_list_move_skips_items_missing_from_source() {
        let t = shelves("xy", "pq");
        let cmds = plan_move(&t, Shelf::A, Shelf::B, &['z', 'y'], 0);
        assert_eq!(
            cmds,
            vec![Command::remove(Shelf::A, 'y'), Command::insert(Shelf::B, 'y', 0)]
        );
    }

    #[test]
    fn missing_item_is_skipped_not_fatal() {
        let mut t = shelves("abc", "");
        let mut history = UndoRedoManager::new(100);

        let applied = history.execute_transaction(
            &mut t,
            vec![Command::remove(Shelf::A, 'z'), Command::remove(Shelf::A, 'b')],
            "remove",
        );
        assert!(applied);
        assert_eq!(text(&t.a), "ac");

        history.undo(&mut t);
        assert_eq!(text(&t.a), "abc");
    }

    #[test]
    fn all_skipped_records_nothing() {
        let mut t = shelves("abc", "");
        let mut history = UndoRedoManager::new(100);
        assert!(!history.execute(&mut t, Command::remove(Shelf::A, 'z'), "noop"));
        assert!(!history.can_undo());
    }

    #[test]
    fn undo_and_redo_on_empty_stacks_are_noops() {
        let mut t = shelves("abc", "");
        let mut history: UndoRedoManager<Shelf, char> = UndoRedoManager::new(100);
        assert_eq!(history.undo(&mut t), None);
        assert_eq!(history.redo(&mut t), None);
        assert_eq!(text(&t.a), "abc");
    }

    #[test]
    fn new_command_clears_redo() {
        let mut t = shelves("abc", "");
        let mut history = UndoRedoManager::new(100);
        history.execute(&mut t, Command::insert(Shelf::A, 'z', 0), "insert");
        history.undo(&mut t);
        assert!(history.can_redo());

        history.execute(&mut t, Command::remove(Shelf::A, 'a'), "remove");
        assert!(!history.can_redo());
    }

    #[test]
    fn transaction_undoes_in_reverse_order() {
        let mut t = shelves("abc", "");
        let mut history = UndoRedoManager::new(100);

        history.execute_transaction(
            &mut t,
            vec![
                Command::remove(Shelf::A, 'a'),
                Command::insert(Shelf::A, 'a', 2),
                Command::move_item(Shelf::A, 0, 1),
            ],
            "shuffle",
        );
        assert_eq!(text(&t.a), "cba");

        assert_eq!(history.undo(&mut t).as_deref(), Some("shuffle"));
        assert_eq!(text(&t.a), "abc");
        assert_eq!(history.redo(&mut t).as_deref(), Some("shuffle"));
        assert_eq!(text(&t.a), "cba");
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut t = shelves("", "");
        let mut history = UndoRedoManager::new(3);
        for (i, c) in "abcde".chars().enumerate() {
            history.execute(&mut t, Command::insert(Shelf::A, c, i), "insert");
        }
        let mut undone = 0;
        while history.undo(&mut t).is_some() {
            undone += 1;
        }
        assert_eq!(undone, 3);
        assert_eq!(text(&t.a), "ab");
    }

    #[test]
    fn stack_changed_fires_on_push_and_pop() {
        let mut t = shelves("abc", "");
        let mut history = UndoRedoManager::new(100);
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let sub = history.on_stack_changed(move || counter.set(counter.get() + 1));

        history.execute(&mut t, Command::remove(Shelf::A, 'a'), "remove");
        history.undo(&mut t);
        history.redo(&mut t);
        assert_eq!(fired.get(), 3);

        drop(sub);
        history.undo(&mut t);
        assert_eq!(fired.get(), 3);
    }
}
