//! Core error types for chatgraph-core.
//!
//! Uses `thiserror` for structured, matchable variants covering malformed
//! node data. These are all caller-correctable problems.

use thiserror::Error;

/// Core errors produced by the chatgraph-core crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Two response keys on one node differ only by case.
    #[error("duplicate response key '{key}' (keys are matched case-insensitively)")]
    DuplicateResponseKey { key: String },

    /// A response key was empty or whitespace only.
    #[error("response key must not be blank")]
    BlankResponseKey,

    /// Parallel key/target lists had different lengths.
    #[error("Mismatched response keys and next node IDs.")]
    MismatchedResponses { keys: usize, targets: usize },

    /// Stored text did not name a known node type.
    #[error("unknown node type: '{0}'")]
    UnknownNodeType(String),

    /// Stored text did not name a known sender.
    #[error("unknown sender: '{0}'")]
    UnknownSender(String),
}
