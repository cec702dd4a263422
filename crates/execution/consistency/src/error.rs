//! Error types for the consistency layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by a [`KeyValueStore`](crate::KeyValueStore) backend.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum KvError {
    /// The backend failed to serve the request.
    #[error("key-value backend error: {0}")]
    Backend(String),
}

/// Errors that can occur while reading or writing the mismatch ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Filesystem failure on the ledger file.
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure of the key-value store backing the ledger.
    #[error("ledger store error: {0}")]
    Kv(#[from] KvError),
}

/// Errors returned while assembling a [`ConsistencyContext`](crate::ConsistencyContext).
#[derive(Debug, Error)]
pub enum ConsistencyError {
    /// The data directory could not be created.
    #[error("failed to create data directory {path}: {source}")]
    DataDir {
        /// The directory that was requested.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
}
