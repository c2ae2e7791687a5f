//! Error types for the conversation engine and admin layer.
//!
//! Two kinds of failure are distinguished. Validation errors are
//! caller-correctable (a malformed graph edit, an unknown node id) and their
//! messages are meant to be shown as-is. Integrity errors are fatal to the
//! current call: the graph the engine depends on is broken (a response points
//! at a missing node, no Invalid or End node can be resolved even after
//! bootstrap). An unmatched user response is never an error.

use chatgraph_core::{CoreError, NodeId};
use chatgraph_storage::StorageError;

/// Errors produced by [`crate::ConversationEngine`] and [`crate::Admin`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A caller-correctable problem with a requested change.
    #[error("{0}")]
    Validation(String),

    /// A node id supplied by the caller does not exist.
    #[error("Invalid node Id: {0}")]
    UnknownNode(NodeId),

    /// The stored graph violates an invariant the engine relies on.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Returns `true` for errors the caller can fix and retry.
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_) | EngineError::UnknownNode(_))
    }

    /// Returns `true` for errors that indicate a broken graph.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            EngineError::Integrity(_)
                | EngineError::Storage(StorageError::IntegrityError { .. })
        )
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        EngineError::Validation(err.to_string())
    }
}
