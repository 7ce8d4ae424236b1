use thiserror::Error;

/// Errors reported by the tree operations in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A structural insertion targeted a slot that is already occupied, or a
    /// descent targeted a child of a vacant slot.
    #[error("position is already occupied or does not exist")]
    InvalidPosition,

    /// An ordered insertion collided with a live entry for the same key.
    #[error("key is already present in the tree")]
    DuplicateKey,

    /// A lookup or removal missed: the key is absent, or present but hidden.
    #[error("key not found in the tree")]
    NotFound,
}

/// Convenience alias for results produced by tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
