pub mod geom;
pub mod id;
pub mod model;

pub use id::{IdAllocator, NodeId};
pub use model::{Node, NodeKind, NodeRecord, NodeTree, TreeError};

// Re-export kurbo geometry so downstream crates agree on one version.
pub use kurbo::{Affine, Point, Rect, Vec2};
