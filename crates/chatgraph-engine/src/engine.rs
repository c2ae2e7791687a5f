//! The conversation state machine.
//!
//! [`ConversationEngine`] borrows a [`GraphStore`] for the duration of a call
//! and advances a caller-owned [`Session`]. Each turn:
//!
//! 1. logs the raw input as a User transaction,
//! 2. matches it case-insensitively against the current node's responses,
//! 3. on a match, moves to the target (or stops at a terminal End node),
//! 4. on a miss, shows the Invalid message and rolls back to the last valid
//!    node,
//! 5. runs end-of-chat resolution when the cursor lands on a node without
//!    responses.
//!
//! Every chatbot line appended to the transcript is logged as exactly one
//! Chatbot transaction; the `You: ` echo line pairs with the User transaction
//! from step 1.

use serde::Serialize;

use chatgraph_core::{
    DefaultNodeKind, NewTransaction, Node, NodeId, NodeType, Sender, SessionId,
    USER_LINE_PREFIX,
};
use chatgraph_storage::{GraphStore, StorageError};

use crate::error::EngineError;
use crate::session::Session;

/// Where end-of-chat resolution took the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndOfChat {
    /// An End node with responses; the conversation continues from there.
    Hub { node: NodeId },
    /// A plain End node (authored or provisioned); the conversation is over.
    Terminal { node: NodeId },
}

/// What a single turn did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The input matched and the cursor moved to `node`.
    Advanced {
        node: NodeId,
        end_of_chat: Option<EndOfChat>,
    },
    /// The input matched nothing; the cursor is back on the last valid node.
    Rejected { end_of_chat: Option<EndOfChat> },
    /// The input led to a terminal End node.
    Terminated { node: NodeId },
}

/// Drives sessions over a graph store.
pub struct ConversationEngine<'s, S: GraphStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: GraphStore + ?Sized> ConversationEngine<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        ConversationEngine { store }
    }

    /// Starts a new session on the First node.
    ///
    /// Without a First node the (possibly provisioned) Invalid node stands in,
    /// so a session can always start.
    pub fn initialize_chat(&mut self) -> Result<Session, EngineError> {
        let start = match self.store.find_node_by_type(NodeType::First)? {
            Some(first) => first,
            None => {
                tracing::warn!("no first node; starting on the invalid node");
                self.ensure(DefaultNodeKind::Invalid)?
            }
        };

        let mut session = Session::new(SessionId::generate(), start.id);
        self.say(&mut session, &start.message)?;
        tracing::info!(session = %session.id(), node = %start.id, "chat initialized");
        Ok(session)
    }

    /// Advances `session` by one user input.
    pub fn handle_user_response(
        &mut self,
        session: &mut Session,
        input: &str,
    ) -> Result<TurnOutcome, EngineError> {
        self.log(session.id(), input, Sender::User)?;

        let current = self.resolve(session.current_node(), "session cursor")?;
        let Some(target_id) = current.responses.lookup(input) else {
            return self.reject(session, input);
        };

        let target = self.resolve(target_id, "response target")?;
        if target.is_terminal_end() {
            session.stop_at(target.id);
            self.say(session, &target.message)?;
            tracing::info!(session = %session.id(), node = %target.id, "end node reached");
            return Ok(TurnOutcome::Terminated { node: target.id });
        }

        session.advance_to(target.id);
        session.push_line(format!("{}{}", USER_LINE_PREFIX, input));
        self.say(session, &target.message)?;
        tracing::debug!(session = %session.id(), node = %target.id, "advanced");

        let end_of_chat = if target.responses.is_empty() {
            Some(self.resolve_end_of_chat(session)?)
        } else {
            None
        };
        Ok(TurnOutcome::Advanced {
            node: target.id,
            end_of_chat,
        })
    }

    /// Picks where a conversation goes once it runs out of responses.
    ///
    /// Priority, scanning End nodes in store order: the first End node with
    /// responses (a hub, which becomes the new rollback target), then the
    /// first plain End node, then a provisioned default End node.
    pub fn resolve_end_of_chat(&mut self, session: &mut Session) -> Result<EndOfChat, EngineError> {
        let ends = self.store.find_nodes_by_type(NodeType::End)?;

        if let Some(hub) = ends.iter().find(|n| n.is_hub()) {
            session.advance_to(hub.id);
            self.say(session, &hub.message)?;
            tracing::info!(session = %session.id(), node = %hub.id, "moved to end hub");
            return Ok(EndOfChat::Hub { node: hub.id });
        }

        let end = match ends.into_iter().next() {
            Some(end) => end,
            None => self.ensure(DefaultNodeKind::End)?,
        };
        session.stop_at(end.id);
        self.say(session, &end.message)?;
        tracing::info!(session = %session.id(), node = %end.id, "conversation ended");
        Ok(EndOfChat::Terminal { node: end.id })
    }

    fn reject(&mut self, session: &mut Session, input: &str) -> Result<TurnOutcome, EngineError> {
        let invalid = self.ensure(DefaultNodeKind::Invalid)?;
        session.push_line(format!("{}{}", USER_LINE_PREFIX, input));
        self.say(session, &invalid.message)?;
        session.roll_back();
        tracing::debug!(session = %session.id(), "unmatched input; rolled back");

        // A rollback target without responses means the conversation had
        // already run out; resolve the end again.
        let rolled_back = self.resolve(session.current_node(), "rollback target")?;
        let end_of_chat = if rolled_back.responses.is_empty() {
            Some(self.resolve_end_of_chat(session)?)
        } else {
            None
        };
        Ok(TurnOutcome::Rejected { end_of_chat })
    }

    /// Loads a node the graph promises exists.
    fn resolve(&self, id: NodeId, role: &str) -> Result<Node, EngineError> {
        match self.store.get_node(id) {
            Ok(node) => Ok(node),
            Err(StorageError::NodeNotFound(_)) => {
                tracing::error!(node = %id, role, "dangling node reference");
                Err(EngineError::Integrity(format!(
                    "{} points to missing node {}",
                    role, id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn ensure(&mut self, kind: DefaultNodeKind) -> Result<Node, EngineError> {
        self.store.ensure_default_node(kind).map_err(|e| {
            EngineError::Integrity(format!(
                "no {} node could be resolved: {}",
                kind.node_type(),
                e
            ))
        })
    }

    /// Logs a chatbot line, then appends it. A failed write leaves the
    /// transcript untouched.
    fn say(&mut self, session: &mut Session, message: &str) -> Result<(), EngineError> {
        self.log(session.id(), message, Sender::Chatbot)?;
        session.push_line(message.to_string());
        Ok(())
    }

    fn log(&mut self, session: SessionId, message: &str, sender: Sender) -> Result<(), EngineError> {
        let tx = self
            .store
            .append_transaction(&NewTransaction::now(session, message, sender))?;
        tracing::trace!(transaction = %tx.id, %sender, "logged transaction");
        Ok(())
    }
}
