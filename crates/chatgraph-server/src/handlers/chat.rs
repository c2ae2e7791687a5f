//! Chat session handlers (start, respond, transcript, drop).

use axum::extract::{Path, State};
use axum::Json;

use chatgraph_core::SessionId;
use chatgraph_engine::ConversationEngine;
use chatgraph_storage::GraphStore;

use crate::error::ApiError;
use crate::schema::chat::{ChatView, RespondRequest, RespondResponse, TransactionListResponse};
use crate::sessions::SharedSession;
use crate::state::AppState;

fn live_session(state: &AppState, id: i64) -> Result<SharedSession, ApiError> {
    state
        .sessions
        .get(SessionId(id))
        .ok_or_else(|| ApiError::NotFound(format!("session {} not found", id)))
}

/// Starts a new chat session on the First node.
///
/// `POST /chat`
pub async fn start_chat(State(state): State<AppState>) -> Result<Json<ChatView>, ApiError> {
    let session = {
        let mut store = state.store.lock().await;
        ConversationEngine::new(&mut *store).initialize_chat()?
    };
    let view = ChatView::from(&session);
    state.sessions.insert(session);
    Ok(Json(view))
}

/// Advances a session by one user input.
///
/// `POST /chat/{session_id}/respond`
pub async fn respond(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<RespondResponse>, ApiError> {
    let shared = live_session(&state, session_id)?;
    let mut session = shared.lock().await;
    let outcome = {
        let mut store = state.store.lock().await;
        ConversationEngine::new(&mut *store).handle_user_response(&mut session, &req.response)?
    };
    Ok(Json(RespondResponse {
        outcome,
        chat: ChatView::from(&*session),
    }))
}

/// Returns the current transcript of a live session.
///
/// `GET /chat/{session_id}`
pub async fn get_chat(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<Json<ChatView>, ApiError> {
    let shared = live_session(&state, session_id)?;
    let session = shared.lock().await;
    Ok(Json(ChatView::from(&*session)))
}

/// Drops a live session. Its logged transactions are kept.
///
/// `DELETE /chat/{session_id}`
pub async fn end_chat(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.sessions.remove(SessionId(session_id)) {
        return Err(ApiError::NotFound(format!("session {} not found", session_id)));
    }
    tracing::info!(session = session_id, "session dropped");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Lists the transactions logged for a session, live or not.
///
/// `GET /chat/{session_id}/transactions`
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let session_id = SessionId(session_id);
    let store = state.store.lock().await;
    let transactions = store.list_transactions(session_id)?;
    Ok(Json(TransactionListResponse {
        session_id,
        transactions,
    }))
}
