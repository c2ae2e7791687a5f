//! Storage abstraction for chatgraph conversation graphs.
//!
//! Provides the [`GraphStore`] trait defining the storage contract that all
//! backends implement, plus the [`InMemoryStore`] and [`SqliteStore`] as
//! first-class backends.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`traits`]: GraphStore trait definition, including the idempotent
//!   `ensure_default_node` bootstrap
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: SQL schema and migration setup
//! - [`sqlite`]: SqliteStore implementation

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
mod conformance;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::GraphStore;
