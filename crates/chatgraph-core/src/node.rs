//! Conversation nodes and their labelled responses.
//!
//! A [`Node`] is one scripted dialog state: a display message plus a
//! [`ResponseMap`] of labelled outgoing edges. [`NodeType`] is a closed sum
//! type; the First and Invalid roles are singletons (enforced by the admin
//! layer and, for SQLite, by a partial unique index).

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::NodeId;

/// Message of the provisioned default Invalid node.
pub const DEFAULT_INVALID_MESSAGE: &str =
    "I'm sorry, I didn't understand your response. Return to the last request.";
/// Label of the provisioned default Invalid node.
pub const DEFAULT_INVALID_NAME: &str = "Invalid Message";
/// Message of the provisioned default End node.
pub const DEFAULT_END_MESSAGE: &str = "Thanks for chatting!!";
/// Label of the provisioned default End node.
pub const DEFAULT_END_NAME: &str = "End Message";

/// The role a node plays in the conversation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeType {
    /// Entry point of every session. At most one exists.
    First,
    /// Shown when input matches no response. At most one exists.
    Invalid,
    /// Ordinary dialog step.
    #[default]
    Normal,
    /// End of a conversation; with responses it acts as a restart hub.
    End,
}

impl NodeType {
    /// Stable text form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::First => "First",
            NodeType::Invalid => "Invalid",
            NodeType::Normal => "Normal",
            NodeType::End => "End",
        }
    }

    /// Returns `true` for the roles that may exist at most once.
    pub fn is_singleton(&self) -> bool {
        matches!(self, NodeType::First | NodeType::Invalid)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "First" => Ok(NodeType::First),
            "Invalid" => Ok(NodeType::Invalid),
            "Normal" => Ok(NodeType::Normal),
            "End" => Ok(NodeType::End),
            other => Err(CoreError::UnknownNodeType(other.to_string())),
        }
    }
}

/// Node roles the store can provision on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultNodeKind {
    Invalid,
    End,
}

impl DefaultNodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            DefaultNodeKind::Invalid => NodeType::Invalid,
            DefaultNodeKind::End => NodeType::End,
        }
    }

    /// The draft stored when no node of this kind exists yet.
    pub fn draft(&self) -> NodeDraft {
        match self {
            DefaultNodeKind::Invalid => {
                NodeDraft::new(DEFAULT_INVALID_MESSAGE, NodeType::Invalid)
                    .with_name(DEFAULT_INVALID_NAME)
                    .undeletable()
            }
            DefaultNodeKind::End => NodeDraft::new(DEFAULT_END_MESSAGE, NodeType::End)
                .with_name(DEFAULT_END_NAME)
                .undeletable(),
        }
    }
}

/// Labelled outgoing edges of a node, keyed by response text.
///
/// Keys keep the operator's spelling but are compared case-insensitively, so
/// the map never holds two keys that fold to the same lowercase form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseMap(BTreeMap<String, NodeId>);

fn fold(key: &str) -> String {
    key.to_lowercase()
}

impl ResponseMap {
    pub fn new() -> Self {
        ResponseMap(BTreeMap::new())
    }

    /// Builds a response set from parallel key/target lists.
    ///
    /// Fails on mismatched lengths, blank keys, or keys colliding under case
    /// folding.
    pub fn from_pairs(keys: &[String], targets: &[NodeId]) -> Result<Self, CoreError> {
        if keys.len() != targets.len() {
            return Err(CoreError::MismatchedResponses {
                keys: keys.len(),
                targets: targets.len(),
            });
        }
        let mut map = ResponseMap::new();
        for (key, target) in keys.iter().zip(targets) {
            if map.find_key(key).is_some() {
                return Err(CoreError::DuplicateResponseKey { key: key.clone() });
            }
            map.insert(key, *target)?;
        }
        Ok(map)
    }

    /// Inserts a response, replacing any existing key that differs only by
    /// case. Returns the target previously bound to that key.
    pub fn insert(&mut self, key: &str, target: NodeId) -> Result<Option<NodeId>, CoreError> {
        if key.trim().is_empty() {
            return Err(CoreError::BlankResponseKey);
        }
        let previous = self
            .find_key(key)
            .map(str::to_owned)
            .and_then(|existing| self.0.remove(&existing));
        self.0.insert(key.to_string(), target);
        Ok(previous)
    }

    /// Re-checks keys that did not go through [`ResponseMap::insert`], such
    /// as a map deserialized from a request body.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(self.0.len());
        for key in self.0.keys() {
            if key.trim().is_empty() {
                return Err(CoreError::BlankResponseKey);
            }
            if !seen.insert(fold(key)) {
                return Err(CoreError::DuplicateResponseKey { key: key.clone() });
            }
        }
        Ok(())
    }

    /// Looks up user input against the keys, ignoring case.
    pub fn lookup(&self, input: &str) -> Option<NodeId> {
        let folded = fold(input);
        self.0
            .iter()
            .find(|(key, _)| fold(key) == folded)
            .map(|(_, target)| *target)
    }

    fn find_key(&self, key: &str) -> Option<&str> {
        let folded = fold(key);
        self.0
            .keys()
            .find(|existing| fold(existing) == folded)
            .map(String::as_str)
    }

    /// Points every edge targeting `from` at `to`. Returns how many changed.
    pub fn retarget(&mut self, from: NodeId, to: NodeId) -> usize {
        let mut changed = 0;
        for target in self.0.values_mut() {
            if *target == from {
                *target = to;
                changed += 1;
            }
        }
        changed
    }

    pub fn contains_target(&self, id: NodeId) -> bool {
        self.0.values().any(|target| *target == id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.0.iter().map(|(key, target)| (key.as_str(), *target))
    }

    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.values().copied()
    }
}

/// A stored conversation node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Text shown to the user when the conversation reaches this node.
    pub message: String,
    /// Optional operator-facing label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_name: Option<String>,
    /// Whether the admin layer may delete this node.
    pub deletable: bool,
    pub node_type: NodeType,
    #[serde(default)]
    pub responses: ResponseMap,
}

impl Node {
    /// An End node without responses: the conversation stops here.
    pub fn is_terminal_end(&self) -> bool {
        self.node_type == NodeType::End && self.responses.is_empty()
    }

    /// An End node with responses, usable as a restart hub.
    pub fn is_hub(&self) -> bool {
        self.node_type == NodeType::End && !self.responses.is_empty()
    }

    /// Splits the node back into its id and draft.
    pub fn into_draft(self) -> (NodeId, NodeDraft) {
        (
            self.id,
            NodeDraft {
                message: self.message,
                message_name: self.message_name,
                deletable: self.deletable,
                node_type: self.node_type,
                responses: self.responses,
            },
        )
    }
}

/// A node that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDraft {
    pub message: String,
    #[serde(default)]
    pub message_name: Option<String>,
    #[serde(default = "default_deletable")]
    pub deletable: bool,
    #[serde(default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub responses: ResponseMap,
}

fn default_deletable() -> bool {
    true
}

impl NodeDraft {
    pub fn new(message: impl Into<String>, node_type: NodeType) -> Self {
        NodeDraft {
            message: message.into(),
            message_name: None,
            deletable: true,
            node_type,
            responses: ResponseMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.message_name = Some(name.into());
        self
    }

    pub fn with_responses(mut self, responses: ResponseMap) -> Self {
        self.responses = responses;
        self
    }

    pub fn undeletable(mut self) -> Self {
        self.deletable = false;
        self
    }

    /// Attaches an id, producing a full node.
    pub fn into_node(self, id: NodeId) -> Node {
        Node {
            id,
            message: self.message,
            message_name: self.message_name,
            deletable: self.deletable,
            node_type: self.node_type,
            responses: self.responses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn lookup_ignores_case() {
        let map = ResponseMap::from_pairs(&keys(&["yes", "No"]), &[NodeId(2), NodeId(3)]).unwrap();
        assert_eq!(map.lookup("YES"), Some(NodeId(2)));
        assert_eq!(map.lookup("no"), Some(NodeId(3)));
        assert_eq!(map.lookup("maybe"), None);
    }

    #[test]
    fn lookup_does_not_trim() {
        let map = ResponseMap::from_pairs(&keys(&["go"]), &[NodeId(1)]).unwrap();
        assert_eq!(map.lookup(" go"), None);
    }

    #[test]
    fn from_pairs_rejects_case_collisions() {
        let err = ResponseMap::from_pairs(&keys(&["Yes", "yES"]), &[NodeId(1), NodeId(2)])
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateResponseKey {
                key: "yES".to_string()
            }
        );
    }

    #[test]
    fn from_pairs_rejects_mismatched_lengths() {
        let err = ResponseMap::from_pairs(&keys(&["a", "b"]), &[NodeId(1)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MismatchedResponses { keys: 2, targets: 1 }
        ));
    }

    #[test]
    fn insert_replaces_key_differing_by_case() {
        let mut map = ResponseMap::new();
        map.insert("Help", NodeId(1)).unwrap();
        let previous = map.insert("HELP", NodeId(9)).unwrap();
        assert_eq!(previous, Some(NodeId(1)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().next(), Some(("HELP", NodeId(9))));
    }

    #[test]
    fn insert_rejects_blank_key() {
        let mut map = ResponseMap::new();
        assert_eq!(map.insert("  ", NodeId(1)), Err(CoreError::BlankResponseKey));
    }

    #[test]
    fn retarget_rewrites_matching_edges_only() {
        let mut map = ResponseMap::from_pairs(
            &keys(&["a", "b", "c"]),
            &[NodeId(5), NodeId(6), NodeId(5)],
        )
        .unwrap();
        assert_eq!(map.retarget(NodeId(5), NodeId(1)), 2);
        assert!(!map.contains_target(NodeId(5)));
        assert_eq!(map.lookup("b"), Some(NodeId(6)));
    }

    #[test]
    fn node_type_text_roundtrip() {
        for ty in [NodeType::First, NodeType::Invalid, NodeType::Normal, NodeType::End] {
            assert_eq!(ty.as_str().parse::<NodeType>().unwrap(), ty);
        }
        assert!("FIRST_NODE".parse::<NodeType>().is_err());
    }

    #[test]
    fn terminal_and_hub_classification() {
        let end = NodeDraft::new("bye", NodeType::End).into_node(NodeId(1));
        assert!(end.is_terminal_end());
        assert!(!end.is_hub());

        let mut responses = ResponseMap::new();
        responses.insert("again", NodeId(0)).unwrap();
        let hub = NodeDraft::new("again?", NodeType::End)
            .with_responses(responses)
            .into_node(NodeId(2));
        assert!(hub.is_hub());
        assert!(!hub.is_terminal_end());

        let leaf = NodeDraft::new("leaf", NodeType::Normal).into_node(NodeId(3));
        assert!(!leaf.is_terminal_end());
    }

    #[test]
    fn default_drafts_are_undeletable() {
        let invalid = DefaultNodeKind::Invalid.draft();
        assert_eq!(invalid.node_type, NodeType::Invalid);
        assert_eq!(invalid.message, DEFAULT_INVALID_MESSAGE);
        assert!(!invalid.deletable);

        let end = DefaultNodeKind::End.draft();
        assert_eq!(end.message_name.as_deref(), Some(DEFAULT_END_NAME));
        assert!(!end.deletable);
    }

    #[test]
    fn draft_deserializes_with_defaults() {
        let draft: NodeDraft = serde_json::from_str(r#"{"message": "hello"}"#).unwrap();
        assert_eq!(draft.node_type, NodeType::Normal);
        assert!(draft.deletable);
        assert!(draft.responses.is_empty());
    }

    #[test]
    fn validate_catches_collisions_from_deserialized_maps() {
        let map: ResponseMap = serde_json::from_str(r#"{"Yes": 1, "yes": 2}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert!(matches!(
            map.validate(),
            Err(CoreError::DuplicateResponseKey { .. })
        ));

        let map: ResponseMap = serde_json::from_str(r#"{" ": 1}"#).unwrap();
        assert_eq!(map.validate(), Err(CoreError::BlankResponseKey));
    }
}
