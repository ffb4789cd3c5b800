//! Request and response bodies of the agent webhooks.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};
use crate::identity::AuthenticatedUser;
use crate::limits::{MAX_SURVEY_NOTES_LEN, MAX_SURVEY_RATING, MIN_SURVEY_RATING};
use crate::session::{MessageId, SessionId, TicketId};

/// Password login form, posted to the auth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(max = 128))]
    pub name: String,

    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

/// Auth endpoint response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, alias = "accessToken", alias = "access_token")]
    pub token: Option<String>,
}

/// One user turn, posted to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub message: String,
    pub username: String,
    pub name: String,
    pub session_id: Option<SessionId>,
    /// Client id of the optimistic user message, echoed back by the store
    pub message_id: MessageId,
}

impl TurnRequest {
    pub fn new(
        user: &AuthenticatedUser,
        message: impl Into<String>,
        session_id: Option<SessionId>,
        message_id: MessageId,
    ) -> Self {
        Self {
            message: message.into(),
            username: user.identity.username.clone(),
            name: user.identity.name.clone(),
            session_id,
            message_id,
        }
    }
}

/// Thumbs up or down on an agent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackRating {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub message_id: MessageId,
    pub rating: FeedbackRating,
}

/// Post-chat survey as filled in by the user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SurveyForm {
    #[validate(range(min = MIN_SURVEY_RATING, max = MAX_SURVEY_RATING))]
    pub rating: u8,

    #[serde(default)]
    #[validate(length(max = MAX_SURVEY_NOTES_LEN))]
    pub notes: String,
}

impl SurveyForm {
    pub fn new(rating: u8, notes: impl Into<String>) -> Result<Self> {
        let form = Self {
            rating,
            notes: notes.into(),
        };
        form.validate()
            .map_err(|e| Error::validation(e.to_string()))?;
        Ok(form)
    }
}

/// Survey body as the survey endpoint expects it: the rating travels as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRequest {
    pub rating: String,
    pub notes: String,
    pub ticket_id: Option<TicketId>,
}

impl SurveyRequest {
    pub fn new(form: &SurveyForm, ticket_id: Option<TicketId>) -> Self {
        Self {
            rating: form.rating.to_string(),
            notes: form.notes.clone(),
            ticket_id,
        }
    }
}
