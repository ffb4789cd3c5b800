//! Auth session manager.
//!
//! `Uninitialized -> Loading -> Authenticated | Anonymous`. The credential and
//! the activity timestamp live in the session store; the decoded identity
//! lives only in memory.

use chat_core::error::AuthErrorCode;
use chat_core::{AuthenticatedUser, Credential, Error, LoginRequest, Result};
use chrono::Utc;
use parking_lot::RwLock;
use realtime_store::RealtimeStore;
use serde::Serialize;
use std::sync::Arc;
use telemetry::metrics;
use tracing::{debug, info, warn};
use validator::Validate;
use webhook_gateway::AgentGateway;

use crate::activity::ActivityTracker;
use crate::closure::close_remote;
use crate::storage::SessionStore;

#[derive(Debug, Clone)]
pub enum AuthState {
    Uninitialized,
    Loading,
    Authenticated(AuthenticatedUser),
    Anonymous,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Authenticated(_) => "authenticated",
            Self::Anonymous => "anonymous",
        }
    }
}

/// Result of [`AuthSessionManager::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitOutcome {
    Authenticated,
    Anonymous,
    /// A stored login was dropped because the activity window or the
    /// credential itself expired.
    Expired,
}

pub struct AuthSessionManager {
    store: Arc<dyn RealtimeStore>,
    gateway: Arc<dyn AgentGateway>,
    local: SessionStore,
    activity: ActivityTracker,
    state: RwLock<AuthState>,
}

impl AuthSessionManager {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        gateway: Arc<dyn AgentGateway>,
        local: SessionStore,
        activity: ActivityTracker,
    ) -> Self {
        Self {
            store,
            gateway,
            local,
            activity,
            state: RwLock::new(AuthState::Uninitialized),
        }
    }

    /// Restore the login from storage.
    pub async fn initialize(&self) -> InitOutcome {
        *self.state.write() = AuthState::Loading;

        let Some(raw) = self.local.auth_token() else {
            *self.state.write() = AuthState::Anonymous;
            debug!("No stored credential");
            return InitOutcome::Anonymous;
        };

        let credential = match Credential::decode(&raw) {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable stored credential");
                self.clear_local();
                *self.state.write() = AuthState::Anonymous;
                return InitOutcome::Anonymous;
            }
        };

        let now = Utc::now();
        if self.activity.is_expired_at(now) || credential.is_expired_at(now) {
            if let Some(id) = self.local.session_id() {
                close_remote(self.store.as_ref(), &id, "inactivity_expired").await;
            }
            self.clear_local();
            metrics().sessions_expired.inc();
            *self.state.write() = AuthState::Anonymous;
            info!(username = %credential.claims().username, "Stored login expired");
            return InitOutcome::Expired;
        }

        let user = AuthenticatedUser::new(credential);
        debug!(username = %user.username(), "Restored login");
        *self.state.write() = AuthState::Authenticated(user);
        self.activity.touch_at(now);
        InitOutcome::Authenticated
    }

    /// Adopt a credential. Decoding errors are returned, not swallowed.
    pub fn login(&self, raw: &str) -> Result<AuthenticatedUser> {
        let credential = Credential::decode(raw)?;
        self.local.set_auth_token(credential.as_str())?;
        self.local.set_last_activity(Utc::now())?;

        let user = AuthenticatedUser::new(credential);
        info!(username = %user.username(), "Logged in");
        *self.state.write() = AuthState::Authenticated(user.clone());
        Ok(user)
    }

    /// Exchange a password form for a credential at the auth endpoint.
    pub async fn login_with_password(&self, request: &LoginRequest) -> Result<AuthenticatedUser> {
        request
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;

        let response = self.gateway.login(request).await?;
        let token = response
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::auth(AuthErrorCode::LoginRejected, "login response carried no token")
            })?;
        self.login(&token)
    }

    /// Close the stored session, then forget everything.
    ///
    /// The close completes before the session id is cleared.
    pub async fn logout(&self) {
        if let Some(id) = self.local.session_id() {
            close_remote(self.store.as_ref(), &id, "logout").await;
        }
        self.clear_local();
        *self.state.write() = AuthState::Anonymous;
        info!("Logged out");
    }

    /// Forget the login after the chat side has handled expiry.
    pub fn expire(&self) {
        self.clear_local();
        *self.state.write() = AuthState::Anonymous;
        info!("Login expired after inactivity");
    }

    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    pub fn current(&self) -> Option<AuthenticatedUser> {
        match &*self.state.read() {
            AuthState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// True until `initialize` has settled.
    pub fn is_loading(&self) -> bool {
        matches!(
            *self.state.read(),
            AuthState::Uninitialized | AuthState::Loading
        )
    }

    /// Whether the current login has run past its activity window or `exp`.
    pub fn is_expired(&self) -> bool {
        let now = Utc::now();
        match &*self.state.read() {
            AuthState::Authenticated(user) => {
                self.activity.is_expired_at(now) || user.credential.is_expired_at(now)
            }
            _ => false,
        }
    }

    /// Record user activity. Ignored unless authenticated.
    pub fn record_activity(&self) -> bool {
        if self.current().is_none() {
            return false;
        }
        self.activity.touch()
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    fn clear_local(&self) {
        if let Err(e) = self.local.clear() {
            warn!(error = %e, "Failed to clear local state");
        }
    }
}

impl std::fmt::Debug for AuthSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionManager")
            .field("state", &self.state.read().as_str())
            .finish()
    }
}
