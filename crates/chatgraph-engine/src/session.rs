//! Per-conversation traversal state.
//!
//! A [`Session`] is an explicit value handed to every engine call. It holds
//! node ids only; the nodes themselves are re-read from the store on each
//! turn, so admin edits made mid-conversation are visible on the next turn.

use serde::Serialize;

use chatgraph_core::{NodeId, SessionId};

/// Whether the conversation is still in progress.
///
/// `Ended` is not absorbing: the engine keeps accepting turns after the end
/// and re-runs end-of-chat resolution when appropriate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Active,
    Ended,
}

/// The mutable cursor and transcript of one conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    id: SessionId,
    current_node: NodeId,
    last_valid_node: NodeId,
    history: Vec<String>,
    phase: SessionPhase,
}

impl Session {
    /// A session positioned on `start` with an empty transcript.
    pub(crate) fn new(id: SessionId, start: NodeId) -> Self {
        Session {
            id,
            current_node: start,
            last_valid_node: start,
            history: Vec::new(),
            phase: SessionPhase::Active,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The node whose responses the next input is matched against.
    pub fn current_node(&self) -> NodeId {
        self.current_node
    }

    /// The rollback target for unmatched input.
    pub fn last_valid_node(&self) -> NodeId {
        self.last_valid_node
    }

    /// Display lines in order: chatbot lines verbatim, user lines prefixed
    /// with `You: `.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_ended(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    pub(crate) fn push_line(&mut self, line: String) {
        self.history.push(line);
    }

    /// Moves the cursor to `node` and records it as the rollback target.
    pub(crate) fn advance_to(&mut self, node: NodeId) {
        self.current_node = node;
        self.last_valid_node = node;
        self.phase = SessionPhase::Active;
    }

    /// Parks the cursor on an end node without touching the rollback target.
    pub(crate) fn stop_at(&mut self, node: NodeId) {
        self.current_node = node;
        self.phase = SessionPhase::Ended;
    }

    /// Returns the cursor to the last valid node.
    pub(crate) fn roll_back(&mut self) {
        self.current_node = self.last_valid_node;
        self.phase = SessionPhase::Active;
    }
}
