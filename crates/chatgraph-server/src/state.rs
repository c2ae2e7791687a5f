//! Application state shared by all handlers.
//!
//! The store sits in `Arc<tokio::sync::Mutex<>>` so handlers await the lock
//! without blocking the tokio runtime. `SqliteStore` holds a
//! `rusqlite::Connection`, which is `!Sync`, so an `RwLock` is not an option.
//!
//! Lock order is session first, then store. The store lock is held only for
//! the duration of one engine or admin call.

use std::sync::Arc;

use chatgraph_storage::SqliteStore;

use crate::error::ApiError;
use crate::sessions::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    /// The shared graph store (async Mutex, non-blocking await).
    pub store: Arc<tokio::sync::Mutex<SqliteStore>>,
    /// Live chat sessions.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Creates an `AppState` backed by the SQLite database at `db_path`.
    pub fn new(db_path: &str) -> Result<Self, ApiError> {
        let store = SqliteStore::new(db_path)?;
        tracing::info!(path = %db_path, "opened graph store");
        Ok(Self::with_store(store))
    }

    /// Creates an `AppState` with an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ApiError> {
        Ok(Self::with_store(SqliteStore::in_memory()?))
    }

    fn with_store(store: SqliteStore) -> Self {
        AppState {
            store: Arc::new(tokio::sync::Mutex::new(store)),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}
