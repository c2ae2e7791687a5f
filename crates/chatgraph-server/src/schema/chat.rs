//! Chat session request/response types.

use serde::{Deserialize, Serialize};

use chatgraph_core::{NodeId, SessionId, Transaction};
use chatgraph_engine::{Session, SessionPhase, TurnOutcome};

/// Body of `POST /chat/{session_id}/respond`.
#[derive(Debug, Clone, Deserialize)]
pub struct RespondRequest {
    /// The user's raw input, matched case-insensitively.
    pub response: String,
}

/// Snapshot of a session returned by every chat endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub session_id: SessionId,
    pub current_node: NodeId,
    pub last_valid_node: NodeId,
    pub phase: SessionPhase,
    /// Full transcript: chatbot lines verbatim, user lines prefixed `You: `.
    pub history: Vec<String>,
}

impl From<&Session> for ChatView {
    fn from(session: &Session) -> Self {
        ChatView {
            session_id: session.id(),
            current_node: session.current_node(),
            last_valid_node: session.last_valid_node(),
            phase: session.phase(),
            history: session.history().to_vec(),
        }
    }
}

/// Response of `POST /chat/{session_id}/respond`.
#[derive(Debug, Clone, Serialize)]
pub struct RespondResponse {
    pub outcome: TurnOutcome,
    #[serde(flatten)]
    pub chat: ChatView,
}

/// Response of `GET /chat/{session_id}/transactions`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionListResponse {
    pub session_id: SessionId,
    pub transactions: Vec<Transaction>,
}
