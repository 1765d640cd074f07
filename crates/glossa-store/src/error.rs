//! Error types for the glossa-store crate.
//!
//! All persistence operations return [`StoreError`] via [`StoreResult`].
//! Uses `thiserror` for ergonomic, zero-cost error definitions.
//!
//! Not-found is never an error: loads return `Option`. A malformed
//! identifier arity is a programmer error and asserts instead.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL operation failed.
    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured backend could not be reached. Fatal at setup time:
    /// an operator who explicitly selected a backend must not be
    /// silently downgraded to the in-memory adapter.
    #[error("{backend} unreachable: {message}")]
    Connection {
        backend: &'static str,
        message: String,
    },

    /// A stored document carries a collection name outside the closed
    /// set. This is a configuration error, not a runtime condition.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// A document identifier could not be interpreted, or a document's
    /// collection does not match the type it was requested as.
    #[error("invalid document identifier: {0}")]
    InvalidIdentifier(String),

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}
