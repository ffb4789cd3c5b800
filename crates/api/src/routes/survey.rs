//! Post-chat survey endpoints.

use axum::{extract::State, Json};
use chat_session::ChatSnapshot;
use serde::Deserialize;

use crate::extractors::CurrentUser;
use crate::response::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SurveyBody {
    pub rating: u8,
    #[serde(default)]
    pub notes: String,
}

/// POST /survey - Submit the survey of the closed session.
pub async fn submit_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SurveyBody>,
) -> Result<Json<ChatSnapshot>, ApiError> {
    state
        .client
        .chat()
        .submit_survey(&user, body.rating, &body.notes)
        .await?;
    Ok(Json(state.client.chat().snapshot()))
}

/// POST /survey/skip - Close the survey without submitting.
pub async fn skip_handler(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Json<ChatSnapshot> {
    state.client.chat().skip_survey();
    Json(state.client.chat().snapshot())
}
