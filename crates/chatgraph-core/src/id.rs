//! Stable ID newtypes for stored entities.
//!
//! All IDs are distinct newtype wrappers over `i64` (SQLite's
//! `INTEGER PRIMARY KEY`), so a `NodeId` cannot be accidentally used where a
//! `SessionId` is expected.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// Stable conversation node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub i64);

/// Identifier of one chat session.
///
/// Session ids are time-derived (milliseconds since the Unix epoch) and bumped
/// past the last issued value so two sessions started within the same
/// millisecond still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub i64);

/// Identifier of one logged transaction (transcript line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

static LAST_SESSION_ID: AtomicI64 = AtomicI64::new(0);

impl SessionId {
    /// Allocates a fresh session id, unique within this process.
    pub fn generate() -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = LAST_SESSION_ID.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match LAST_SESSION_ID.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return SessionId(next),
                Err(observed) => last = observed,
            }
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
