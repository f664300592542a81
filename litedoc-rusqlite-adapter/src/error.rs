use litedoc::errors::{DocError, ErrorKind};
use thiserror::Error;

/// Errors raised by the SQLite store.
#[derive(Error, Debug)]
pub enum RusqliteStoreError {
    /// Failure reported by SQLite, message passed through unchanged
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Operation on a store whose connection has been closed
    #[error("Store is closed")]
    Closed,
}

impl From<RusqliteStoreError> for DocError {
    /// Converts a store error into a `StorageError`, keeping the driver message.
    fn from(err: RusqliteStoreError) -> Self {
        DocError::new(&err.to_string(), ErrorKind::StorageError)
    }
}

/// Result type of connection-level operations.
pub type RusqliteStoreResult<T> = Result<T, RusqliteStoreError>;
