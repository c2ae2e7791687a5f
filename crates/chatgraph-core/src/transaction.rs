//! Transcript log records.
//!
//! One [`Transaction`] is persisted per transcript line a session produces.
//! The log is append-only.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{SessionId, TransactionId};

/// Prefix of user lines in the displayed transcript.
pub const USER_LINE_PREFIX: &str = "You: ";

/// Who produced a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    User,
    Chatbot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Chatbot => "Chatbot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Sender::User),
            "Chatbot" => Ok(Sender::Chatbot),
            other => Err(CoreError::UnknownSender(other.to_string())),
        }
    }
}

/// A transaction before the store assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub session_id: SessionId,
    pub message: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl NewTransaction {
    /// Stamps a record with the current time.
    pub fn now(session_id: SessionId, message: impl Into<String>, sender: Sender) -> Self {
        NewTransaction {
            session_id,
            message: message.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            session_id: self.session_id,
            message: self.message,
            sender: self.sender,
            timestamp: self.timestamp,
        }
    }
}

/// A persisted transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub session_id: SessionId,
    pub message: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}
