//! Graph administration request/response types.
//!
//! Nodes are sent as `chatgraph_engine::NodeForm` (type optional) and
//! returned as `chatgraph_core::Node`.

use serde::{Deserialize, Serialize};

use chatgraph_core::{Node, NodeId};

/// Body of `PUT`/`POST /admin/nodes/{id}/responses`: parallel key and target
/// lists.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesRequest {
    pub keys: Vec<String>,
    pub targets: Vec<NodeId>,
}

/// Response of `GET /admin/nodes`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeListResponse {
    pub nodes: Vec<Node>,
}
