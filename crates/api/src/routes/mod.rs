//! API routes.

pub mod auth;
pub mod chat;
pub mod health;
pub mod history;
pub mod survey;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/auth/login",
            get(auth::login_page_handler).post(auth::login_handler),
        )
        .route("/auth/token", post(auth::token_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/activity", post(auth::activity_handler))
        .route("/chat", get(chat::load_handler))
        .route("/chat/start", post(chat::start_handler))
        .route("/chat/messages", post(chat::send_handler))
        .route("/chat/satisfaction", post(chat::satisfaction_handler))
        .route("/chat/ticket", post(chat::ticket_handler))
        .route("/chat/ticket-prompt", delete(chat::dismiss_prompt_handler))
        .route("/chat/feedback", post(chat::feedback_handler))
        .route("/survey", post(survey::submit_handler))
        .route("/survey/skip", post(survey::skip_handler))
        .route("/history", get(history::list_handler))
        .route("/history/:id", get(history::transcript_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
