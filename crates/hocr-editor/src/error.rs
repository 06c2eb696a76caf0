use hocr_core::TreeError;

/// Errors surfaced by the editor.
///
/// Missing items and missing elements are not errors: those edits are
/// skipped. What remains are broken invariants the caller should report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// A resize handle carried a direction that isn't one of the eight
    /// compass points.
    #[error("invalid resize direction {0:#06b}")]
    InvalidDirection(u8),
    #[error(transparent)]
    Tree(#[from] TreeError),
}
