//! Storage error types for chatgraph-storage.
//!
//! [`StorageError`] covers all anticipated failure modes in the storage layer:
//! SQLite and migration failures, serialization, missing nodes, and integrity
//! violations (singleton conflicts, corrupt rows).

use chatgraph_core::NodeId;
use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying SQLite call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No node with the given ID exists.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A data integrity violation was detected.
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },
}
