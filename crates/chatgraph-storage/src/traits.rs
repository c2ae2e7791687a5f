//! The [`GraphStore`] trait defining the storage contract for conversation
//! graphs and their transcript log.
//!
//! All backends (InMemoryStore, SqliteStore) implement this trait, so they are
//! fully swappable without changing engine or admin logic. Every call is
//! synchronous and authoritative: callers observe store state as of the call,
//! with no caching and no snapshot isolation between calls.
//!
//! Iteration order of every listing is ascending node id.

use chatgraph_core::{
    DefaultNodeKind, NewTransaction, Node, NodeDraft, NodeId, NodeType, SessionId, Transaction,
};

use crate::error::StorageError;

/// The storage contract for conversation nodes and transactions.
pub trait GraphStore {
    // -------------------------------------------------------------------
    // Node reads
    // -------------------------------------------------------------------

    /// Retrieves a node by ID, or [`StorageError::NodeNotFound`].
    fn get_node(&self, id: NodeId) -> Result<Node, StorageError>;

    /// Lists all nodes of the given type.
    fn find_nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, StorageError>;

    /// Lists all nodes.
    fn list_nodes(&self) -> Result<Vec<Node>, StorageError>;

    /// Returns the node of a singleton type, or `None` if absent.
    ///
    /// If the store somehow holds several, the lowest id wins.
    fn find_node_by_type(&self, node_type: NodeType) -> Result<Option<Node>, StorageError> {
        Ok(self.find_nodes_by_type(node_type)?.into_iter().next())
    }

    /// Returns `true` if a node with this ID exists.
    fn node_exists(&self, id: NodeId) -> Result<bool, StorageError> {
        match self.get_node(id) {
            Ok(_) => Ok(true),
            Err(StorageError::NodeNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // -------------------------------------------------------------------
    // Node writes
    // -------------------------------------------------------------------

    /// Stores a new node under a freshly allocated ID.
    ///
    /// Fails with [`StorageError::IntegrityError`] if the draft is First or
    /// Invalid and another node already holds that role.
    fn insert_node(&mut self, draft: &NodeDraft) -> Result<Node, StorageError>;

    /// Inserts or replaces a node under its own ID.
    ///
    /// Same singleton rule as [`GraphStore::insert_node`].
    fn upsert_node(&mut self, node: &Node) -> Result<(), StorageError>;

    /// Deletes a node. Edges pointing at it are left untouched.
    fn delete_node(&mut self, id: NodeId) -> Result<(), StorageError>;

    /// Deletes every node.
    fn delete_all_nodes(&mut self) -> Result<(), StorageError>;

    /// Returns the node of `kind`, provisioning the default one if none
    /// exists. Idempotent: repeated calls return the same node.
    fn ensure_default_node(&mut self, kind: DefaultNodeKind) -> Result<Node, StorageError> {
        if let Some(existing) = self.find_node_by_type(kind.node_type())? {
            return Ok(existing);
        }
        let node = self.insert_node(&kind.draft())?;
        tracing::warn!(
            node_id = %node.id,
            node_type = %node.node_type,
            "provisioned default node"
        );
        Ok(node)
    }

    // -------------------------------------------------------------------
    // Transaction log
    // -------------------------------------------------------------------

    /// Appends one transcript record, returning it with its assigned ID.
    fn append_transaction(&mut self, tx: &NewTransaction) -> Result<Transaction, StorageError>;

    /// Lists a session's records in append order.
    fn list_transactions(&self, session: SessionId) -> Result<Vec<Transaction>, StorageError>;
}
