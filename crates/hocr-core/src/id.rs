use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a node in a page tree.
///
/// Ids are assigned in increasing order and never reused, so a stale
/// undo entry that mentions a detached node can't be confused with a
/// node created later.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id counter owned by a tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdAllocator {
    last: u32,
}

impl IdAllocator {
    /// Make sure future ids are greater than `id`.
    pub fn observe(&mut self, id: NodeId) {
        self.last = self.last.max(id.0);
    }

    /// Hand out a fresh id, strictly greater than every id seen so far.
    pub fn next(&mut self) -> NodeId {
        self.last += 1;
        NodeId(self.last)
    }

    pub fn last(&self) -> NodeId {
        NodeId(self.last)
    }
}
