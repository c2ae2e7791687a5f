//! Graph administration handlers.
//!
//! Every edit goes through [`chatgraph_engine::Admin`], which owns the
//! referential-integrity checks.

use axum::extract::{Path, State};
use axum::Json;

use chatgraph_core::{Node, NodeId};
use chatgraph_engine::{Admin, GraphAudit, NodeForm};

use crate::error::ApiError;
use crate::schema::admin::{NodeListResponse, ResponsesRequest};
use crate::state::AppState;

/// Lists all nodes.
///
/// `GET /admin/nodes`
pub async fn list_nodes(State(state): State<AppState>) -> Result<Json<NodeListResponse>, ApiError> {
    let mut store = state.store.lock().await;
    let nodes = Admin::new(&mut *store).list_nodes()?;
    Ok(Json(NodeListResponse { nodes }))
}

/// Creates a node.
///
/// `POST /admin/nodes`
pub async fn create_node(
    State(state): State<AppState>,
    Json(form): Json<NodeForm>,
) -> Result<Json<Node>, ApiError> {
    let mut store = state.store.lock().await;
    let node = Admin::new(&mut *store).save_node(None, form)?;
    Ok(Json(node))
}

/// Deletes every node.
///
/// `DELETE /admin/nodes`
pub async fn delete_all_nodes(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut store = state.store.lock().await;
    Admin::new(&mut *store).delete_all_nodes()?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Returns one node.
///
/// `GET /admin/nodes/{id}`
pub async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Node>, ApiError> {
    let mut store = state.store.lock().await;
    let node = Admin::new(&mut *store).get_node(NodeId(id))?;
    Ok(Json(node))
}

/// Updates a node. Existing responses are kept when it has any.
///
/// `PUT /admin/nodes/{id}`
pub async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<NodeForm>,
) -> Result<Json<Node>, ApiError> {
    let mut store = state.store.lock().await;
    let node = Admin::new(&mut *store).save_node(Some(NodeId(id)), form)?;
    Ok(Json(node))
}

/// Deletes a node and redirects responses that pointed at it.
///
/// `DELETE /admin/nodes/{id}`
pub async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut store = state.store.lock().await;
    Admin::new(&mut *store).delete_node(NodeId(id))?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Replaces a node's responses.
///
/// `PUT /admin/nodes/{id}/responses`
pub async fn save_responses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ResponsesRequest>,
) -> Result<Json<Node>, ApiError> {
    let mut store = state.store.lock().await;
    let node = Admin::new(&mut *store).save_responses(NodeId(id), &req.keys, &req.targets)?;
    Ok(Json(node))
}

/// Merges responses into a node's existing ones.
///
/// `POST /admin/nodes/{id}/responses`
pub async fn add_responses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ResponsesRequest>,
) -> Result<Json<Node>, ApiError> {
    let mut store = state.store.lock().await;
    let node = Admin::new(&mut *store).add_responses(NodeId(id), &req.keys, &req.targets)?;
    Ok(Json(node))
}

/// Reports dangling edges, unreachable nodes and duplicated roles.
///
/// `GET /admin/audit`
pub async fn audit(State(state): State<AppState>) -> Result<Json<GraphAudit>, ApiError> {
    let mut store = state.store.lock().await;
    let audit = Admin::new(&mut *store).audit()?;
    Ok(Json(audit))
}
