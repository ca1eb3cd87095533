use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

const DEFAULT_SESSION_ID: &str = "default_session";

#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    pub session_id: Option<String>,
    pub message: String,
}

pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatTurnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = payload
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    let config = state.config.load()?;
    let pipeline = state.factory.get_or_build(&config)?;
    let outcome = pipeline.handle_turn(&session_id, &payload.message).await?;

    Ok(Json(json!({
        "session_id": session_id,
        "answer": outcome.answer,
        "sources": outcome.sources,
    })))
}
