//! CLI error type and its mapping to process exit codes.

use chatgraph_engine::EngineError;
use chatgraph_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Bad input: a rejected graph edit or a malformed import file.
    #[error("{0}")]
    Validation(String),

    /// The stored graph is broken.
    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl CliError {
    /// 1 = usage or validation, 2 = integrity, 3 = I/O or storage.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation(_) | CliError::Json(_) => 1,
            CliError::Integrity(_) => 2,
            CliError::Io(_) | CliError::Storage(_) => 3,
        }
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::IntegrityError { reason } => CliError::Integrity(reason),
            other => CliError::Storage(other),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Integrity(reason) => CliError::Integrity(reason),
            EngineError::Storage(e) => e.into(),
            other => CliError::Validation(other.to_string()),
        }
    }
}
