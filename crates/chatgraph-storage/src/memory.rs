//! In-memory implementation of [`GraphStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests, demos, and anywhere
//! persistence isn't needed. It keeps nodes in a `BTreeMap` so listings come
//! out in ascending id order, matching the SQLite backend.

use std::collections::BTreeMap;

use chatgraph_core::{
    NewTransaction, Node, NodeDraft, NodeId, NodeType, SessionId, Transaction, TransactionId,
};

use crate::error::StorageError;
use crate::traits::GraphStore;

/// In-memory implementation of [`GraphStore`].
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    nodes: BTreeMap<NodeId, Node>,
    transactions: Vec<Transaction>,
    next_node_id: i64,
    next_transaction_id: i64,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        InMemoryStore {
            nodes: BTreeMap::new(),
            transactions: Vec::new(),
            next_node_id: 1,
            next_transaction_id: 1,
        }
    }

    /// Rejects a second First or Invalid node.
    fn check_singleton(&self, node_type: NodeType, id: Option<NodeId>) -> Result<(), StorageError> {
        if !node_type.is_singleton() {
            return Ok(());
        }
        let conflict = self
            .nodes
            .values()
            .find(|n| n.node_type == node_type && Some(n.id) != id);
        match conflict {
            Some(existing) => Err(StorageError::IntegrityError {
                reason: format!(
                    "a {} node already exists with id {}",
                    node_type, existing.id
                ),
            }),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for InMemoryStore {
    fn get_node(&self, id: NodeId) -> Result<Node, StorageError> {
        self.nodes
            .get(&id)
            .cloned()
            .ok_or(StorageError::NodeNotFound(id))
    }

    fn find_nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, StorageError> {
        Ok(self
            .nodes
            .values()
            .filter(|n| n.node_type == node_type)
            .cloned()
            .collect())
    }

    fn list_nodes(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self.nodes.values().cloned().collect())
    }

    fn insert_node(&mut self, draft: &NodeDraft) -> Result<Node, StorageError> {
        self.check_singleton(draft.node_type, None)?;
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        let node = draft.clone().into_node(id);
        self.nodes.insert(id, node.clone());
        Ok(node)
    }

    fn upsert_node(&mut self, node: &Node) -> Result<(), StorageError> {
        self.check_singleton(node.node_type, Some(node.id))?;
        // Keep id allocation ahead of explicitly chosen ids.
        self.next_node_id = self.next_node_id.max(node.id.0 + 1);
        self.nodes.insert(node.id, node.clone());
        Ok(())
    }

    fn delete_node(&mut self, id: NodeId) -> Result<(), StorageError> {
        self.nodes
            .remove(&id)
            .ok_or(StorageError::NodeNotFound(id))?;
        Ok(())
    }

    fn delete_all_nodes(&mut self) -> Result<(), StorageError> {
        self.nodes.clear();
        Ok(())
    }

    fn append_transaction(&mut self, tx: &NewTransaction) -> Result<Transaction, StorageError> {
        let id = TransactionId(self.next_transaction_id);
        self.next_transaction_id += 1;
        let record = tx.clone().into_transaction(id);
        self.transactions.push(record.clone());
        Ok(record)
    }

    fn list_transactions(&self, session: SessionId) -> Result<Vec<Transaction>, StorageError> {
        Ok(self
            .transactions
            .iter()
            .filter(|t| t.session_id == session)
            .cloned()
            .collect())
    }
}
