//! History endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chat_core::{Message, SessionId};
use chat_session::{HistoryQuery, SessionSummary};

use crate::extractors::CurrentUser;
use crate::response::ApiError;
use crate::state::AppState;

/// GET /history - Closed sessions of the caller.
pub async fn list_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let sessions = state
        .client
        .history()
        .closed_sessions(user.username(), &query)
        .await?;
    Ok(Json(sessions))
}

/// GET /history/:id - Read-only transcript.
pub async fn transcript_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let id = SessionId::new(id);
    match state.client.history().transcript(user.username(), &id).await? {
        Some(messages) => Ok(Json(messages)),
        None => Err(ApiError::not_found(format!("session {} not found", id))),
    }
}
