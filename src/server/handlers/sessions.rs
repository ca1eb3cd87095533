use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn get_session_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let turns = state.registry.get_or_create(&session_id);
    Json(json!({
        "session_id": session_id,
        "messages": turns,
    }))
}

pub async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    state.registry.clear(&session_id);
    tracing::info!(%session_id, "session cleared");
    Json(json!({ "status": "cleared" }))
}
