//! Test fixtures: credentials, users and agent texts.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chat_core::{AuthenticatedUser, Credential, LoginRequest};
use chrono::Utc;

/// Agent text that files a ticket and closes the chat.
pub const CLOSING_TEXT: &str =
    "Your ticket has been created successfully and the chat has been closed. Thank you!";

/// Signed-token shaped credential for `username`. The signature is not checked.
pub fn token(username: &str) -> String {
    token_with_exp(username, None)
}

/// Credential whose `exp` passed an hour ago.
pub fn expired_token(username: &str) -> String {
    token_with_exp(username, Some(Utc::now().timestamp() - 3_600))
}

pub fn token_with_exp(username: &str, exp: Option<i64>) -> String {
    let mut claims = serde_json::json!({
        "username": username,
        "name": format!("{} Tester", username),
        "email": format!("{}@example.com", username),
    });
    if let Some(exp) = exp {
        claims["exp"] = exp.into();
    }
    format!(
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

pub fn user(username: &str) -> AuthenticatedUser {
    AuthenticatedUser::new(Credential::decode(&token(username)).expect("fixture token decodes"))
}

pub fn login_request(username: &str) -> LoginRequest {
    LoginRequest {
        name: format!("{} Tester", username),
        username: username.to_string(),
        email: Some(format!("{}@example.com", username)),
        password: "correct horse battery staple".to_string(),
    }
}
