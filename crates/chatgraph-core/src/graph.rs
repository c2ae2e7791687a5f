//! The logical conversation graph derived from stored nodes.
//!
//! [`ConversationGraph`] is a read-only petgraph view built from a snapshot of
//! node records. Each response becomes a directed edge weighted by its key.
//! Edges whose target id is not in the snapshot cannot be represented in the
//! graph and are collected as [`DanglingEdge`]s instead.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use serde::Serialize;

use crate::id::NodeId;
use crate::node::Node;

/// A response whose target node does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingEdge {
    pub source: NodeId,
    pub key: String,
    pub target: NodeId,
}

/// Directed graph of node ids connected by response keys.
#[derive(Debug, Clone)]
pub struct ConversationGraph {
    graph: DiGraph<NodeId, String>,
    indices: HashMap<NodeId, NodeIndex>,
    dangling: Vec<DanglingEdge>,
}

impl ConversationGraph {
    /// Builds the graph from a node snapshot.
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::with_capacity(nodes.len());
        for node in nodes {
            indices.insert(node.id, graph.add_node(node.id));
        }

        let mut dangling = Vec::new();
        for node in nodes {
            let source = indices[&node.id];
            for (key, target) in node.responses.iter() {
                match indices.get(&target) {
                    Some(&target_idx) => {
                        graph.add_edge(source, target_idx, key.to_string());
                    }
                    None => dangling.push(DanglingEdge {
                        source: node.id,
                        key: key.to_string(),
                        target,
                    }),
                }
            }
        }

        ConversationGraph {
            graph,
            indices,
            dangling,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of resolvable edges (dangling ones excluded).
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn dangling_edges(&self) -> &[DanglingEdge] {
        &self.dangling
    }

    /// All nodes reachable from `start` (inclusive), in ascending id order.
    /// Empty when `start` is not in the graph.
    pub fn reachable_from(&self, start: NodeId) -> Vec<NodeId> {
        let Some(&start_idx) = self.indices.get(&start) else {
            return Vec::new();
        };
        let mut bfs = Bfs::new(&self.graph, start_idx);
        let mut reached = Vec::new();
        while let Some(idx) = bfs.next(&self.graph) {
            reached.push(self.graph[idx]);
        }
        reached.sort();
        reached
    }

    /// All nodes not reachable from `start`, in ascending id order.
    pub fn unreachable_from(&self, start: NodeId) -> Vec<NodeId> {
        let reached = self.reachable_from(start);
        let mut missing: Vec<NodeId> = self
            .indices
            .keys()
            .copied()
            .filter(|id| reached.binary_search(id).is_err())
            .collect();
        missing.sort();
        missing
    }
}
