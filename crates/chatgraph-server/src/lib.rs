//! HTTP/JSON API server for chatgraph conversations.
//!
//! Exposes chat sessions (start, respond, transcript) and graph
//! administration (node CRUD, response editing, audit) over a shared
//! SQLite-backed [`chatgraph_storage::GraphStore`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod sessions;
pub mod state;
