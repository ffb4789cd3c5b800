//! Login, logout and activity endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chat_core::{AuthenticatedUser, LoginRequest, UserIdentity};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extractors::CurrentUser;
use crate::response::ApiError;
use crate::state::AppState;

/// Where an authenticated visitor of the login page is sent.
const CHAT_REDIRECT: &str = "/chat";

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatus {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
}

impl AuthStatus {
    fn authenticated(user: &AuthenticatedUser) -> Self {
        Self {
            state: "authenticated".to_string(),
            user: Some(user.identity.clone()),
        }
    }

    fn anonymous() -> Self {
        Self {
            state: "anonymous".to_string(),
            user: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub token: String,
}

/// GET /auth/me - Current auth state. 503 while initializing.
pub async fn me_handler(State(state): State<AppState>) -> Result<Json<AuthStatus>, ApiError> {
    let auth = state.client.auth();
    if auth.is_loading() {
        return Err(ApiError::loading());
    }
    Ok(Json(match auth.current() {
        Some(user) => AuthStatus::authenticated(&user),
        None => AuthStatus::anonymous(),
    }))
}

/// GET /auth/login - Login view gate. Authenticated callers go to the chat.
pub async fn login_page_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let auth = state.client.auth();
    if auth.is_loading() {
        return Err(ApiError::loading());
    }
    if auth.current().is_some() && !auth.is_expired() {
        return Ok(Redirect::to(CHAT_REDIRECT).into_response());
    }
    Ok(Json(AuthStatus::anonymous()).into_response())
}

/// POST /auth/login - Password login.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthStatus>, ApiError> {
    let user = state.client.login_with_password(&request).await?;
    Ok(Json(AuthStatus::authenticated(&user)))
}

/// POST /auth/token - Adopt an existing credential.
pub async fn token_handler(
    State(state): State<AppState>,
    Json(body): Json<TokenBody>,
) -> Result<Json<AuthStatus>, ApiError> {
    let user = state.client.login(&body.token)?;
    Ok(Json(AuthStatus::authenticated(&user)))
}

/// POST /auth/logout - Close the active session and forget the login.
pub async fn logout_handler(State(state): State<AppState>) -> StatusCode {
    state.client.logout().await;
    info!("User logged out");
    StatusCode::NO_CONTENT
}

/// POST /activity - User interaction in the view. The guard records it.
pub async fn activity_handler(CurrentUser(_user): CurrentUser) -> StatusCode {
    StatusCode::NO_CONTENT
}
