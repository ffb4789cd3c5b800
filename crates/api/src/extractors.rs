//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chat_core::AuthenticatedUser;
use tracing::debug;

use crate::response::ApiError;
use crate::state::AppState;

/// Logged-in caller of a session-bearing route.
///
/// Rejects with 401 and a login redirect when nobody is logged in or the
/// inactivity window has run out; the latter also expires the session.
/// An accepted request counts as user activity.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.client.auth().is_loading() {
            return Err(ApiError::loading());
        }

        match state.client.require_user().await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(e) => {
                debug!(path = %parts.uri.path(), error = %e, "Rejected unauthenticated request");
                Err(e.into())
            }
        }
    }
}
