//! One browser tab's worth of chat client.
//!
//! Wires the session store, auth, the chat controller and history together
//! and owns the cross-component sequences: expiry, logout, page load.

use chat_core::error::AuthErrorCode;
use chat_core::{AuthenticatedUser, Error, LoginRequest, Result};
use realtime_store::RealtimeStore;
use std::sync::Arc;
use tracing::debug;
use webhook_gateway::AgentGateway;

use crate::activity::ActivityTracker;
use crate::auth::{AuthSessionManager, InitOutcome};
use crate::config::ChatSettings;
use crate::controller::ChatController;
use crate::history::HistoryService;
use crate::state::{ChatEvent, ChatSnapshot};
use crate::storage::SessionStore;

pub struct ChatClient {
    auth: AuthSessionManager,
    chat: ChatController,
    history: HistoryService,
    local: SessionStore,
}

impl ChatClient {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        gateway: Arc<dyn AgentGateway>,
        local: SessionStore,
        settings: ChatSettings,
    ) -> Self {
        let activity = ActivityTracker::new(local.clone(), settings.inactivity_timeout());
        let history = HistoryService::new(store.clone(), settings.history_cache_ttl());
        let auth = AuthSessionManager::new(store.clone(), gateway.clone(), local.clone(), activity);
        let chat = ChatController::new(store, gateway, local.clone(), settings);
        Self {
            auth,
            chat,
            history,
            local,
        }
    }

    pub fn auth(&self) -> &AuthSessionManager {
        &self.auth
    }

    pub fn chat(&self) -> &ChatController {
        &self.chat
    }

    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    pub fn local(&self) -> &SessionStore {
        &self.local
    }

    /// Restore the stored login. An expired one leaves the chat in the
    /// expired state.
    pub async fn initialize(&self) -> InitOutcome {
        let outcome = self.auth.initialize().await;
        if outcome == InitOutcome::Expired {
            self.chat.mark_expired();
        }
        outcome
    }

    pub fn login(&self, token: &str) -> Result<AuthenticatedUser> {
        self.chat.detach();
        self.auth.login(token)
    }

    pub async fn login_with_password(&self, request: &LoginRequest) -> Result<AuthenticatedUser> {
        let user = self.auth.login_with_password(request).await?;
        self.chat.detach();
        Ok(user)
    }

    /// Close the active session once, then forget the login.
    pub async fn logout(&self) {
        self.chat.detach();
        self.auth.logout().await;
    }

    /// Inactivity expiry: the chat closes its session, then the login goes.
    pub async fn expire(&self) {
        self.chat.apply(ChatEvent::InactivityExpired).await;
        self.auth.expire();
    }

    /// Gate for session-bearing operations.
    ///
    /// Anonymous callers get AUTH_004. An expired login is expired here and
    /// also gets AUTH_004; otherwise the call counts as activity.
    pub async fn require_user(&self) -> Result<AuthenticatedUser> {
        let Some(user) = self.auth.current() else {
            return Err(Error::auth(AuthErrorCode::Unauthenticated, "login required"));
        };
        if self.auth.is_expired() {
            debug!(username = %user.username(), "Login expired at request");
            self.expire().await;
            return Err(Error::auth(AuthErrorCode::Unauthenticated, "session expired"));
        }
        self.auth.record_activity();
        Ok(user)
    }

    /// Chat page load: resume the stored session if it is still usable.
    pub async fn load_chat(&self, user: &AuthenticatedUser) -> ChatSnapshot {
        self.chat.resume(user).await
    }

    /// Tear down the chat side.
    pub fn dispose(&self) {
        self.chat.dispose();
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("auth", &self.auth)
            .field("chat", &self.chat)
            .finish()
    }
}
