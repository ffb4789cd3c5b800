//! Application state shared across handlers.

use chat_session::ChatClient;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The tab's chat client
    pub client: Arc<ChatClient>,
}

impl AppState {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}
