//! Bulk graph import from a JSON file.
//!
//! Nodes in the file name each other by symbolic `ref` rather than by id, so a
//! graph can be authored before any ids exist:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "ref": "hi",  "message": "Hi", "node_type": "First", "responses": { "go": "bye" } },
//!     { "ref": "bye", "message": "Bye" }
//!   ]
//! }
//! ```
//!
//! Import runs in two passes through [`Admin`]: every node is created without
//! responses, then each node's responses are saved with refs resolved to the
//! new ids. All edits go through the same validation as the HTTP API.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;

use chatgraph_core::{NodeId, NodeType};
use chatgraph_engine::{Admin, NodeForm};
use chatgraph_storage::GraphStore;

use crate::error::CliError;

#[derive(Debug, Deserialize)]
pub struct ImportFile {
    pub nodes: Vec<ImportNode>,
}

#[derive(Debug, Deserialize)]
pub struct ImportNode {
    #[serde(rename = "ref")]
    pub reference: String,
    pub message: String,
    #[serde(default)]
    pub message_name: Option<String>,
    #[serde(default = "default_deletable")]
    pub deletable: bool,
    #[serde(default)]
    pub node_type: Option<NodeType>,
    /// Response key to the `ref` of the target node.
    #[serde(default)]
    pub responses: BTreeMap<String, String>,
}

fn default_deletable() -> bool {
    true
}

impl ImportFile {
    pub fn parse(text: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Imports `file` into `store`, returning each ref's assigned id.
pub fn import_graph<S: GraphStore + ?Sized>(
    store: &mut S,
    file: ImportFile,
) -> Result<HashMap<String, NodeId>, CliError> {
    let mut seen = HashSet::with_capacity(file.nodes.len());
    for node in &file.nodes {
        if !seen.insert(node.reference.as_str()) {
            return Err(CliError::Validation(format!(
                "duplicate node ref '{}'",
                node.reference
            )));
        }
    }

    let mut ids: HashMap<String, NodeId> = HashMap::with_capacity(file.nodes.len());

    let mut admin = Admin::new(store);
    for node in &file.nodes {
        let saved = admin.save_node(
            None,
            NodeForm {
                message: node.message.clone(),
                message_name: node.message_name.clone(),
                deletable: node.deletable,
                node_type: node.node_type,
                responses: Default::default(),
            },
        )?;
        ids.insert(node.reference.clone(), saved.id);
    }

    for node in file.nodes.iter().filter(|n| !n.responses.is_empty()) {
        let mut keys = Vec::with_capacity(node.responses.len());
        let mut targets = Vec::with_capacity(node.responses.len());
        for (key, target_ref) in &node.responses {
            let target = ids.get(target_ref).copied().ok_or_else(|| {
                CliError::Validation(format!(
                    "node '{}' response '{}' refers to unknown ref '{}'",
                    node.reference, key, target_ref
                ))
            })?;
            keys.push(key.clone());
            targets.push(target);
        }
        admin.save_responses(ids[&node.reference], &keys, &targets)?;
    }

    tracing::info!(count = ids.len(), "imported nodes");
    Ok(ids)
}
