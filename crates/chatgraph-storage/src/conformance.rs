//! Backend-agnostic checks run against every [`GraphStore`] implementation.

use chatgraph_core::{
    DefaultNodeKind, NewTransaction, NodeDraft, NodeId, NodeType, ResponseMap, Sender, SessionId,
};

use crate::error::StorageError;
use crate::traits::GraphStore;

pub fn crud_nodes<S: GraphStore>(store: &mut S) {
    let mut responses = ResponseMap::new();
    responses.insert("Yes", NodeId(2)).unwrap();
    let draft = NodeDraft::new("Hi", NodeType::First)
        .with_name("greeting")
        .with_responses(responses);

    // Insert
    let node = store.insert_node(&draft).unwrap();
    assert_eq!(node.message, "Hi");

    // Get
    let fetched = store.get_node(node.id).unwrap();
    assert_eq!(fetched, node);
    assert_eq!(fetched.responses.lookup("yes"), Some(NodeId(2)));
    assert!(store.node_exists(node.id).unwrap());

    // Update
    let mut updated = fetched.clone();
    updated.message = "Hello".to_string();
    updated.deletable = false;
    store.upsert_node(&updated).unwrap();
    assert_eq!(store.get_node(node.id).unwrap(), updated);

    // Delete
    store.delete_node(node.id).unwrap();
    assert!(matches!(
        store.get_node(node.id),
        Err(StorageError::NodeNotFound(id)) if id == node.id
    ));
    assert!(!store.node_exists(node.id).unwrap());
    assert!(matches!(
        store.delete_node(node.id),
        Err(StorageError::NodeNotFound(_))
    ));
}

pub fn listing_order_and_type_queries<S: GraphStore>(store: &mut S) {
    let a = store.insert_node(&NodeDraft::new("end a", NodeType::End)).unwrap();
    let b = store.insert_node(&NodeDraft::new("normal", NodeType::Normal)).unwrap();
    let c = store.insert_node(&NodeDraft::new("end c", NodeType::End)).unwrap();

    let all: Vec<NodeId> = store.list_nodes().unwrap().iter().map(|n| n.id).collect();
    assert_eq!(all, vec![a.id, b.id, c.id]);

    let ends: Vec<NodeId> = store
        .find_nodes_by_type(NodeType::End)
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ends, vec![a.id, c.id]);
    assert_eq!(
        store.find_node_by_type(NodeType::End).unwrap().map(|n| n.id),
        Some(a.id)
    );
    assert!(store.find_node_by_type(NodeType::First).unwrap().is_none());

    store.delete_all_nodes().unwrap();
    assert!(store.list_nodes().unwrap().is_empty());
}

pub fn singleton_types_are_enforced<S: GraphStore>(store: &mut S) {
    let first = store.insert_node(&NodeDraft::new("one", NodeType::First)).unwrap();
    let err = store
        .insert_node(&NodeDraft::new("two", NodeType::First))
        .unwrap_err();
    assert!(matches!(err, StorageError::IntegrityError { .. }), "{err:?}");

    // Re-saving the holder of the role is fine.
    store.upsert_node(&first).unwrap();

    // Promoting another node into the role is not.
    let other = store.insert_node(&NodeDraft::new("other", NodeType::Normal)).unwrap();
    let mut promoted = other.clone();
    promoted.node_type = NodeType::First;
    assert!(matches!(
        store.upsert_node(&promoted),
        Err(StorageError::IntegrityError { .. })
    ));
    assert_eq!(store.get_node(other.id).unwrap().node_type, NodeType::Normal);

    // End nodes are not singletons.
    store.insert_node(&NodeDraft::new("e1", NodeType::End)).unwrap();
    store.insert_node(&NodeDraft::new("e2", NodeType::End)).unwrap();
}

pub fn ensure_default_node_is_idempotent<S: GraphStore>(store: &mut S) {
    let invalid = store.ensure_default_node(DefaultNodeKind::Invalid).unwrap();
    assert_eq!(invalid.node_type, NodeType::Invalid);
    assert!(!invalid.deletable);
    let again = store.ensure_default_node(DefaultNodeKind::Invalid).unwrap();
    assert_eq!(again.id, invalid.id);
    assert_eq!(store.find_nodes_by_type(NodeType::Invalid).unwrap().len(), 1);

    // An operator-authored End node is reused rather than shadowed.
    let authored = store.insert_node(&NodeDraft::new("Goodbye", NodeType::End)).unwrap();
    let end = store.ensure_default_node(DefaultNodeKind::End).unwrap();
    assert_eq!(end.id, authored.id);
}

pub fn transactions_are_per_session_and_ordered<S: GraphStore>(store: &mut S) {
    let s1 = SessionId(100);
    let s2 = SessionId(200);
    let first = store
        .append_transaction(&NewTransaction::now(s1, "Hi", Sender::Chatbot))
        .unwrap();
    store
        .append_transaction(&NewTransaction::now(s2, "other", Sender::Chatbot))
        .unwrap();
    let second = store
        .append_transaction(&NewTransaction::now(s1, "go", Sender::User))
        .unwrap();
    assert!(second.id > first.id);

    let log = store.list_transactions(s1).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], first);
    assert_eq!(log[1].message, "go");
    assert_eq!(log[1].sender, Sender::User);
    assert!(store.list_transactions(SessionId(999)).unwrap().is_empty());
}
