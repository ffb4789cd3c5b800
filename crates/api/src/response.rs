//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Where the view goes when the caller is not logged in.
pub const LOGIN_REDIRECT: &str = "/login";

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_connected: bool,
    pub gateway_connected: bool,
    pub active_subscriptions: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Safe to re-invoke the same operation
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            retryable: false,
            redirect: None,
        }
    }
}

/// API error carrying the core error code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    /// 401 that sends the view to the login page.
    pub fn login_required(code: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut err = Self::with_code(StatusCode::UNAUTHORIZED, code, msg);
        err.response.redirect = Some(LOGIN_REDIRECT.to_string());
        err
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    /// Auth state is still being restored; the view should wait.
    pub fn loading() -> Self {
        let mut err = Self::with_code(
            StatusCode::SERVICE_UNAVAILABLE,
            "AUTH_LOADING",
            "authentication is initializing",
        );
        err.response.retryable = true;
        err.retry_after = Some(1);
        err
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<chat_core::Error> for ApiError {
    fn from(err: chat_core::Error) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &err {
            chat_core::Error::Auth { message, .. }
            | chat_core::Error::Session { message, .. }
            | chat_core::Error::Turn { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let mut api = if status == StatusCode::UNAUTHORIZED {
            ApiError::login_required(err.error_code(), message)
        } else {
            ApiError::with_code(status, err.error_code(), message)
        };
        api.response.retryable = err.is_retryable();
        api
    }
}
