//! Live chat sessions shared across handler tasks.
//!
//! [`SessionRegistry`] maps session ids to sessions. Each session sits behind
//! its own async mutex, so turns on one session run strictly one after
//! another while other sessions proceed. Sessions live until a client deletes
//! them.

use std::sync::Arc;

use dashmap::DashMap;

use chatgraph_core::SessionId;
use chatgraph_engine::Session;

/// A session handle that can be locked across `.await` points.
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

/// Registry of live sessions, backed by `DashMap` for concurrent access.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SharedSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: DashMap::new(),
        }
    }

    /// Registers a session under its own id and returns its handle.
    pub fn insert(&self, session: Session) -> SharedSession {
        let id = session.id();
        let shared = Arc::new(tokio::sync::Mutex::new(session));
        self.sessions.insert(id, Arc::clone(&shared));
        shared
    }

    /// Returns the session handle, if the session is live.
    ///
    /// The map guard is released before returning, so callers never hold a
    /// shard lock while awaiting the session mutex.
    pub fn get(&self, id: SessionId) -> Option<SharedSession> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Drops a session. Returns `true` if it was live.
    pub fn remove(&self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgraph_engine::ConversationEngine;
    use chatgraph_storage::InMemoryStore;

    #[tokio::test]
    async fn insert_get_remove() {
        let mut store = InMemoryStore::new();
        let session = ConversationEngine::new(&mut store).initialize_chat().unwrap();
        let id = session.id();

        let registry = SessionRegistry::new();
        registry.insert(session);
        assert_eq!(registry.len(), 1);

        let handle = registry.get(id).unwrap();
        assert_eq!(handle.lock().await.id(), id);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());
    }
}
