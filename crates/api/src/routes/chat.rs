//! Chat view endpoints.

use axum::{extract::State, Json};
use chat_core::error::TurnErrorCode;
use chat_core::{FeedbackRating, MessageId};
use chat_session::{ChatSnapshot, FeedbackOutcome, TurnOutcome};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extractors::CurrentUser;
use crate::response::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SatisfactionBody {
    pub satisfied: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBody {
    pub message_id: MessageId,
    pub rating: FeedbackRating,
}

/// Turn result plus the chat state after it.
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub outcome: TurnOutcome,
    pub chat: ChatSnapshot,
}

/// GET /chat - Page load.
pub async fn load_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<ChatSnapshot> {
    Json(state.client.load_chat(&user).await)
}

/// POST /chat/start - Start a new session.
pub async fn start_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ChatSnapshot>, ApiError> {
    state.client.chat().start(&user).await?;
    Ok(Json(state.client.chat().snapshot()))
}

/// POST /chat/messages - Send one user turn.
pub async fn send_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SendBody>,
) -> Result<Json<TurnResponse>, ApiError> {
    let outcome = state.client.chat().send(&user, &body.message).await?;
    turn_response(&state, outcome)
}

/// POST /chat/satisfaction - Yes/no satisfaction shortcut.
pub async fn satisfaction_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SatisfactionBody>,
) -> Result<Json<TurnResponse>, ApiError> {
    let outcome = state.client.chat().satisfaction(&user, body.satisfied).await?;
    turn_response(&state, outcome)
}

/// POST /chat/ticket - Ask the agent to file a ticket.
pub async fn ticket_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<TurnResponse>, ApiError> {
    let outcome = state.client.chat().request_ticket(&user).await?;
    turn_response(&state, outcome)
}

/// DELETE /chat/ticket-prompt - Dismiss the ticket prompts.
pub async fn dismiss_prompt_handler(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Json<ChatSnapshot> {
    state.client.chat().dismiss_ticket_prompt();
    Json(state.client.chat().snapshot())
}

/// POST /chat/feedback - Rate an agent message.
pub async fn feedback_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<FeedbackBody>,
) -> Result<Json<FeedbackOutcome>, ApiError> {
    let outcome = state
        .client
        .chat()
        .send_feedback(&user, body.message_id, body.rating)
        .await?;
    Ok(Json(outcome))
}

fn turn_response(state: &AppState, outcome: TurnOutcome) -> Result<Json<TurnResponse>, ApiError> {
    if outcome == TurnOutcome::Busy {
        debug!("Rejecting send while a turn is in flight");
        return Err(chat_core::Error::turn(
            TurnErrorCode::InFlight,
            "a message is already awaiting its reply",
        )
        .into());
    }
    Ok(Json(TurnResponse {
        outcome,
        chat: state.client.chat().snapshot(),
    }))
}
