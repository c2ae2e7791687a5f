//! Graph editing with referential-integrity checks.
//!
//! [`Admin`] is the only write path for authored nodes. It keeps the
//! invariants the conversation engine relies on: a single First node, a single
//! Invalid node, response targets that exist, undeletable nodes that stay put,
//! and no dangling edges after a deletion (they are redirected to the Invalid
//! node). It talks to the store only and never calls the engine.

use serde::{Deserialize, Serialize};

use chatgraph_core::{
    ConversationGraph, DanglingEdge, DefaultNodeKind, Node, NodeDraft, NodeId, NodeType,
    ResponseMap,
};
use chatgraph_storage::{GraphStore, StorageError};

use crate::error::EngineError;

/// A node as submitted to [`Admin::save_node`].
///
/// Unlike [`NodeDraft`], the type may be left out. An untyped node saved into
/// an empty store becomes the First node; otherwise it is Normal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeForm {
    pub message: String,
    #[serde(default)]
    pub message_name: Option<String>,
    #[serde(default = "default_deletable")]
    pub deletable: bool,
    #[serde(default)]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub responses: ResponseMap,
}

fn default_deletable() -> bool {
    true
}

impl NodeForm {
    fn into_draft(self, node_type: NodeType) -> NodeDraft {
        NodeDraft {
            message: self.message,
            message_name: self.message_name,
            deletable: self.deletable,
            node_type,
            responses: self.responses,
        }
    }
}

impl From<NodeDraft> for NodeForm {
    fn from(draft: NodeDraft) -> Self {
        NodeForm {
            message: draft.message,
            message_name: draft.message_name,
            deletable: draft.deletable,
            node_type: Some(draft.node_type),
            responses: draft.responses,
        }
    }
}

/// Result of [`Admin::audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphAudit {
    pub node_count: usize,
    pub first_node: Option<NodeId>,
    pub invalid_node: Option<NodeId>,
    /// Responses pointing at nodes that do not exist.
    pub dangling_edges: Vec<DanglingEdge>,
    /// Normal nodes no response path from the First node reaches. Invalid and
    /// End nodes are reached by fallback rather than by edges and are never
    /// listed.
    pub unreachable_nodes: Vec<NodeId>,
    /// Singleton roles held by more than one node.
    pub duplicate_roles: Vec<NodeType>,
}

impl GraphAudit {
    /// No dangling edges, no duplicated roles, and a First node to start on.
    pub fn is_healthy(&self) -> bool {
        self.first_node.is_some() && self.dangling_edges.is_empty() && self.duplicate_roles.is_empty()
    }
}

/// Administrative operations over a graph store.
pub struct Admin<'s, S: GraphStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: GraphStore + ?Sized> Admin<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Admin { store }
    }

    pub fn list_nodes(&self) -> Result<Vec<Node>, EngineError> {
        Ok(self.store.list_nodes()?)
    }

    pub fn get_node(&self, id: NodeId) -> Result<Node, EngineError> {
        match self.store.get_node(id) {
            Ok(node) => Ok(node),
            Err(StorageError::NodeNotFound(_)) => Err(EngineError::UnknownNode(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a node (`id` = `None`) or updates an existing one.
    ///
    /// A node saved into an empty store becomes the First node unless it is
    /// explicitly Normal. An update keeps the node's existing responses
    /// when it has any; those are edited through [`Admin::save_responses`] and
    /// [`Admin::add_responses`].
    pub fn save_node(
        &mut self,
        id: Option<NodeId>,
        form: impl Into<NodeForm>,
    ) -> Result<Node, EngineError> {
        let form = form.into();
        if let Some(node_type) = form.node_type {
            self.validate_type_uniqueness(node_type, id)?;
        }
        let existing = match id {
            Some(id) => Some(self.get_node(id)?),
            None => None,
        };

        let store_empty = self.store.list_nodes()?.is_empty();
        let node_type = match (form.node_type, &existing) {
            (Some(NodeType::Normal), _) => NodeType::Normal,
            (requested, None) if store_empty => {
                tracing::debug!(requested = ?requested, "first saved node becomes the First node");
                NodeType::First
            }
            (Some(requested), _) => requested,
            // An untyped update keeps the stored type.
            (None, Some(existing)) => existing.node_type,
            (None, None) => NodeType::Normal,
        };
        let mut draft = form.into_draft(node_type);

        let node = match (id, existing) {
            (Some(id), Some(existing)) => {
                if existing.responses.is_empty() {
                    draft.responses.validate()?;
                    self.validate_targets(&draft.responses, Some(id))?;
                } else {
                    draft.responses = existing.responses;
                }
                let node = draft.into_node(id);
                self.store.upsert_node(&node)?;
                node
            }
            _ => {
                draft.responses.validate()?;
                self.validate_targets(&draft.responses, None)?;
                self.store.insert_node(&draft)?
            }
        };
        tracing::info!(node = %node.id, node_type = %node.node_type, "saved node");
        Ok(node)
    }

    /// Deletes a deletable node and redirects responses that pointed at it to
    /// the Invalid node.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        let node = match self.store.get_node(id) {
            Ok(node) => node,
            Err(StorageError::NodeNotFound(_)) => {
                tracing::error!(node = %id, "delete of missing node");
                return Err(EngineError::Validation("Node does not exist.".to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if !node.deletable {
            tracing::error!(node = %id, "delete of undeletable node");
            return Err(EngineError::Validation(
                "This node cannot be deleted.".to_string(),
            ));
        }

        self.store.delete_node(id)?;

        let referrers: Vec<Node> = self
            .store
            .list_nodes()?
            .into_iter()
            .filter(|n| n.responses.contains_target(id))
            .collect();
        if !referrers.is_empty() {
            // Provisioned after the delete so a deleted Invalid node is
            // replaced rather than targeted.
            let invalid = self.store.ensure_default_node(DefaultNodeKind::Invalid)?;
            for mut referrer in referrers {
                let changed = referrer.responses.retarget(id, invalid.id);
                self.store.upsert_node(&referrer)?;
                tracing::info!(
                    node = %referrer.id,
                    deleted = %id,
                    invalid = %invalid.id,
                    changed,
                    "redirected responses to invalid node"
                );
            }
        }

        tracing::info!(node = %id, "deleted node");
        Ok(())
    }

    pub fn delete_all_nodes(&mut self) -> Result<(), EngineError> {
        self.store.delete_all_nodes()?;
        tracing::warn!("deleted all nodes");
        Ok(())
    }

    /// Replaces a node's responses with the given key/target pairs.
    pub fn save_responses(
        &mut self,
        id: NodeId,
        keys: &[String],
        targets: &[NodeId],
    ) -> Result<Node, EngineError> {
        let mut node = self.get_node(id)?;
        let responses = ResponseMap::from_pairs(keys, targets)?;
        self.validate_targets(&responses, Some(id))?;
        node.responses = responses;
        self.store.upsert_node(&node)?;
        tracing::info!(node = %id, count = node.responses.len(), "saved responses");
        Ok(node)
    }

    /// Merges key/target pairs into a node's responses. A key that differs
    /// from an existing one only by case replaces it.
    pub fn add_responses(
        &mut self,
        id: NodeId,
        keys: &[String],
        targets: &[NodeId],
    ) -> Result<Node, EngineError> {
        let mut node = self.get_node(id)?;
        let additions = ResponseMap::from_pairs(keys, targets)?;
        self.validate_targets(&additions, Some(id))?;
        for (key, target) in additions.iter() {
            node.responses.insert(key, target)?;
            tracing::debug!(node = %id, key, target = %target, "added response");
        }
        self.store.upsert_node(&node)?;
        tracing::info!(node = %id, count = node.responses.len(), "added responses");
        Ok(node)
    }

    /// Checks the stored graph for problems the engine would trip over.
    pub fn audit(&self) -> Result<GraphAudit, EngineError> {
        let nodes = self.store.list_nodes()?;
        let graph = ConversationGraph::from_nodes(&nodes);

        let first_node = nodes.iter().find(|n| n.node_type == NodeType::First).map(|n| n.id);
        let invalid_node = nodes.iter().find(|n| n.node_type == NodeType::Invalid).map(|n| n.id);

        let unreachable = match first_node {
            Some(first) => graph.unreachable_from(first),
            None => nodes.iter().map(|n| n.id).collect(),
        };
        let unreachable_nodes = nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Normal || n.node_type == NodeType::First)
            .map(|n| n.id)
            .filter(|id| unreachable.contains(id))
            .collect();

        let duplicate_roles = [NodeType::First, NodeType::Invalid]
            .into_iter()
            .filter(|ty| nodes.iter().filter(|n| n.node_type == *ty).count() > 1)
            .collect();

        Ok(GraphAudit {
            node_count: nodes.len(),
            first_node,
            invalid_node,
            dangling_edges: graph.dangling_edges().to_vec(),
            unreachable_nodes,
            duplicate_roles,
        })
    }

    fn validate_type_uniqueness(&self, node_type: NodeType, id: Option<NodeId>) -> Result<(), EngineError> {
        if !node_type.is_singleton() {
            return Ok(());
        }
        if let Some(existing) = self.store.find_node_by_type(node_type)? {
            if Some(existing.id) != id {
                let message = match node_type {
                    NodeType::First => format!("A first node already exists with ID: {}", existing.id),
                    _ => format!("An invalid node already exists with ID: {}", existing.id),
                };
                return Err(EngineError::Validation(message));
            }
        }
        Ok(())
    }

    /// Every target must exist; `this` (the node being edited) may target
    /// itself.
    fn validate_targets(&self, responses: &ResponseMap, this: Option<NodeId>) -> Result<(), EngineError> {
        for (key, target) in responses.iter() {
            if Some(target) == this {
                continue;
            }
            if !self.store.node_exists(target)? {
                return Err(EngineError::Validation(format!(
                    "Response '{}' points to unknown node {}",
                    key, target
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgraph_storage::InMemoryStore;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn first_saved_node_is_promoted_unless_normal() {
        let mut store = InMemoryStore::new();
        let node = Admin::new(&mut store)
            .save_node(None, NodeDraft::new("hello", NodeType::End))
            .unwrap();
        assert_eq!(node.node_type, NodeType::First);

        let mut store = InMemoryStore::new();
        let node = Admin::new(&mut store)
            .save_node(None, NodeDraft::new("hello", NodeType::Normal))
            .unwrap();
        assert_eq!(node.node_type, NodeType::Normal);
    }

    #[test]
    fn untyped_node_is_first_only_in_an_empty_store() {
        let untyped = |message: &str| NodeForm {
            message: message.to_string(),
            message_name: None,
            deletable: true,
            node_type: None,
            responses: ResponseMap::new(),
        };
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        assert_eq!(admin.save_node(None, untyped("a")).unwrap().node_type, NodeType::First);
        assert_eq!(admin.save_node(None, untyped("b")).unwrap().node_type, NodeType::Normal);
    }

    #[test]
    fn second_first_node_is_rejected() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        let first = admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let err = admin
            .save_node(None, NodeDraft::new("b", NodeType::First))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            format!("A first node already exists with ID: {}", first.id)
        );
        // Re-saving the First node itself is allowed.
        admin.save_node(Some(first.id), NodeDraft::new("a2", NodeType::First)).unwrap();
    }

    #[test]
    fn second_invalid_node_is_rejected() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        admin.save_node(None, NodeDraft::new("start", NodeType::First)).unwrap();
        let invalid = admin.save_node(None, NodeDraft::new("?", NodeType::Invalid)).unwrap();
        let err = admin
            .save_node(None, NodeDraft::new("??", NodeType::Invalid))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("An invalid node already exists with ID: {}", invalid.id)
        );
    }

    #[test]
    fn update_keeps_existing_responses() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        let a = admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let b = admin.save_node(None, NodeDraft::new("b", NodeType::Normal)).unwrap();
        admin.save_responses(a.id, &keys(&["go"]), &[b.id]).unwrap();

        let updated = admin
            .save_node(Some(a.id), NodeDraft::new("a edited", NodeType::First))
            .unwrap();
        assert_eq!(updated.message, "a edited");
        assert_eq!(updated.responses.lookup("go"), Some(b.id));
    }

    #[test]
    fn update_of_unknown_node_is_rejected() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let err = admin
            .save_node(Some(NodeId(99)), NodeDraft::new("x", NodeType::Normal))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode(NodeId(99))));
        assert_eq!(err.to_string(), "Invalid node Id: 99");
    }

    #[test]
    fn delete_redirects_dangling_responses_to_invalid() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        let a = admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let b = admin.save_node(None, NodeDraft::new("b", NodeType::Normal)).unwrap();
        admin.save_responses(a.id, &keys(&["go", "stay"]), &[b.id, a.id]).unwrap();

        admin.delete_node(b.id).unwrap();

        let invalid = store.find_node_by_type(NodeType::Invalid).unwrap().unwrap();
        assert!(!invalid.deletable);
        let a = store.get_node(a.id).unwrap();
        assert_eq!(a.responses.lookup("go"), Some(invalid.id));
        assert_eq!(a.responses.lookup("stay"), Some(a.id));
    }

    #[test]
    fn delete_without_referrers_provisions_nothing() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let b = admin.save_node(None, NodeDraft::new("b", NodeType::Normal)).unwrap();
        admin.delete_node(b.id).unwrap();
        assert!(store.find_node_by_type(NodeType::Invalid).unwrap().is_none());
    }

    #[test]
    fn deleting_the_invalid_node_redirects_to_a_fresh_default() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        let a = admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let authored = admin.save_node(None, NodeDraft::new("?", NodeType::Invalid)).unwrap();
        admin.save_responses(a.id, &keys(&["help"]), &[authored.id]).unwrap();

        admin.delete_node(authored.id).unwrap();

        let replacement = store.find_node_by_type(NodeType::Invalid).unwrap().unwrap();
        assert_ne!(replacement.id, authored.id);
        assert_eq!(
            store.get_node(a.id).unwrap().responses.lookup("help"),
            Some(replacement.id)
        );
    }

    #[test]
    fn delete_errors_use_admin_messages() {
        let mut store = InMemoryStore::new();
        let undeletable = store
            .insert_node(&NodeDraft::new("keep", NodeType::Normal).undeletable())
            .unwrap();
        let mut admin = Admin::new(&mut store);

        let err = admin.delete_node(NodeId(77)).unwrap_err();
        assert_eq!(err.to_string(), "Node does not exist.");

        let err = admin.delete_node(undeletable.id).unwrap_err();
        assert_eq!(err.to_string(), "This node cannot be deleted.");
        assert!(store.node_exists(undeletable.id).unwrap());
    }

    #[test]
    fn responses_validate_lengths_targets_and_case_collisions() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        let a = admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let b = admin.save_node(None, NodeDraft::new("b", NodeType::Normal)).unwrap();

        let err = admin.save_responses(a.id, &keys(&["x", "y"]), &[b.id]).unwrap_err();
        assert_eq!(err.to_string(), "Mismatched response keys and next node IDs.");

        let err = admin.save_responses(a.id, &keys(&["x"]), &[NodeId(404)]).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("404"));

        let err = admin
            .save_responses(a.id, &keys(&["Yes", "YES"]), &[b.id, b.id])
            .unwrap_err();
        assert!(err.is_validation());

        // Nothing was written by the failed calls.
        assert!(admin.get_node(a.id).unwrap().responses.is_empty());
    }

    #[test]
    fn add_responses_merges_and_replaces_by_case() {
        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        let a = admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let b = admin.save_node(None, NodeDraft::new("b", NodeType::Normal)).unwrap();
        let c = admin.save_node(None, NodeDraft::new("c", NodeType::Normal)).unwrap();

        admin.save_responses(a.id, &keys(&["yes", "no"]), &[b.id, b.id]).unwrap();
        let node = admin.add_responses(a.id, &keys(&["YES", "maybe"]), &[c.id, c.id]).unwrap();

        assert_eq!(node.responses.len(), 3);
        assert_eq!(node.responses.lookup("yes"), Some(c.id));
        assert_eq!(node.responses.lookup("no"), Some(b.id));
        assert_eq!(node.responses.lookup("maybe"), Some(c.id));
    }

    #[test]
    fn audit_reports_dangling_and_unreachable_nodes() {
        let mut store = InMemoryStore::new();
        let a = store.insert_node(&NodeDraft::new("a", NodeType::First)).unwrap();
        let b = store.insert_node(&NodeDraft::new("b", NodeType::Normal)).unwrap();
        let orphan = store.insert_node(&NodeDraft::new("orphan", NodeType::Normal)).unwrap();
        store.insert_node(&NodeDraft::new("bye", NodeType::End)).unwrap();
        let mut a_node = a.clone();
        a_node.responses.insert("go", b.id).unwrap();
        a_node.responses.insert("lost", NodeId(500)).unwrap();
        store.upsert_node(&a_node).unwrap();

        let audit = Admin::new(&mut store).audit().unwrap();
        assert_eq!(audit.node_count, 4);
        assert_eq!(audit.first_node, Some(a.id));
        assert_eq!(audit.invalid_node, None);
        assert_eq!(audit.unreachable_nodes, vec![orphan.id]);
        assert_eq!(audit.dangling_edges.len(), 1);
        assert_eq!(audit.dangling_edges[0].target, NodeId(500));
        assert!(audit.duplicate_roles.is_empty());
        assert!(!audit.is_healthy());
    }

    #[test]
    fn update_ignores_discarded_responses_but_checks_stored_ones() {
        let colliding: ResponseMap = serde_json::from_value(serde_json::json!({ "Go": 2, "GO": 2 })).unwrap();
        let form = |responses: ResponseMap| NodeForm {
            message: "a, edited".to_string(),
            message_name: None,
            deletable: true,
            node_type: None,
            responses,
        };

        let mut store = InMemoryStore::new();
        let mut admin = Admin::new(&mut store);
        let a = admin.save_node(None, NodeDraft::new("a", NodeType::First)).unwrap();
        let b = admin.save_node(None, NodeDraft::new("b", NodeType::Normal)).unwrap();
        admin.save_responses(a.id, &keys(&["go"]), &[b.id]).unwrap();

        // The existing responses are kept, so the submitted ones never reach the store.
        let updated = admin.save_node(Some(a.id), form(colliding.clone())).unwrap();
        assert_eq!(updated.message, "a, edited");
        assert_eq!(updated.responses.lookup("go"), Some(b.id));

        // A node without responses would store them: rejected.
        let err = admin.save_node(Some(b.id), form(colliding.clone())).unwrap_err();
        assert!(err.is_validation());
        let err = admin.save_node(None, form(colliding)).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(admin.list_nodes().unwrap().len(), 2);
    }
}
