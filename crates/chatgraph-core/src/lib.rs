//! Core data model for chatgraph conversation graphs.
//!
//! - [`id`]: NodeId, SessionId, TransactionId newtypes
//! - [`node`]: Node, NodeType, ResponseMap and the provisioned defaults
//! - [`transaction`]: transcript log records
//! - [`graph`]: petgraph view of the stored nodes for integrity audits
//! - [`error`]: CoreError

pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod transaction;

// Re-export commonly used types
pub use error::CoreError;
pub use graph::{ConversationGraph, DanglingEdge};
pub use id::{NodeId, SessionId, TransactionId};
pub use node::{DefaultNodeKind, Node, NodeDraft, NodeType, ResponseMap};
pub use transaction::{NewTransaction, Sender, Transaction, USER_LINE_PREFIX};
