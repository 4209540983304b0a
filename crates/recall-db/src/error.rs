use thiserror::Error;

/// Failures reported by a [`ReviewStore`](crate::ReviewStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("review item not found")]
    NotFound,
    #[error("review item already exists")]
    AlreadyExists,
    /// The stored revision moved on since the item was read.
    #[error("revision conflict: expected {expected}, found {actual}")]
    RevisionConflict { expected: i64, actual: i64 },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
