//! Router assembly for the chatgraph HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Chat sessions
        .route("/chat", post(handlers::chat::start_chat))
        .route(
            "/chat/{session_id}",
            get(handlers::chat::get_chat).delete(handlers::chat::end_chat),
        )
        .route(
            "/chat/{session_id}/respond",
            post(handlers::chat::respond),
        )
        .route(
            "/chat/{session_id}/transactions",
            get(handlers::chat::list_transactions),
        )
        // Graph administration
        .route(
            "/admin/nodes",
            get(handlers::admin::list_nodes)
                .post(handlers::admin::create_node)
                .delete(handlers::admin::delete_all_nodes),
        )
        .route(
            "/admin/nodes/{id}",
            get(handlers::admin::get_node)
                .put(handlers::admin::update_node)
                .delete(handlers::admin::delete_node),
        )
        .route(
            "/admin/nodes/{id}/responses",
            put(handlers::admin::save_responses).post(handlers::admin::add_responses),
        )
        .route("/admin/audit", get(handlers::admin::audit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
