//! Conversation traversal and graph administration for chatgraph.
//!
//! # Modules
//!
//! - [`engine`]: ConversationEngine, the per-turn state machine
//! - [`session`]: Session, the caller-owned cursor and transcript
//! - [`admin`]: Admin, validated graph edits and integrity audits
//! - [`error`]: EngineError with validation/integrity classification
//!
//! Both [`ConversationEngine`] and [`Admin`] borrow a
//! [`chatgraph_storage::GraphStore`] for the duration of a call and hold no
//! state of their own.

pub mod admin;
pub mod engine;
pub mod error;
pub mod session;

pub use admin::{Admin, GraphAudit, NodeForm};
pub use engine::{ConversationEngine, EndOfChat, TurnOutcome};
pub use error::EngineError;
pub use session::{Session, SessionPhase};
