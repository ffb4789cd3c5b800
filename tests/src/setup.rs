//! Common test setup functions.

use api::{router, state::AppState};
use axum::Router;
use chat_core::AuthenticatedUser;
use chat_session::{ChatClient, ChatSettings, SessionStore};
use realtime_store::RealtimeStore;
use std::sync::Arc;
use std::time::Duration;
use webhook_gateway::AgentGateway;

use crate::fixtures;
use crate::mocks::{FlakyStore, MockGateway};

/// Settings with short delays so scheduled transitions fit in a test.
pub fn fast_settings() -> ChatSettings {
    ChatSettings {
        reply_close_delay_ms: 30,
        push_close_delay_ms: 30,
        survey_delay_ms: 30,
        ..ChatSettings::default()
    }
}

/// Longer than any scheduled transition under [`fast_settings`].
pub const SETTLE: Duration = Duration::from_millis(150);

/// Test context with a flaky in-memory store and a scripted gateway.
///
/// Exercises the same production code paths as the binary:
/// - The real `ChatClient` and Axum router
/// - `FlakyStore` implementing `RealtimeStore` over the memory backend
/// - `MockGateway` implementing `AgentGateway`
pub struct TestContext {
    pub store: Arc<FlakyStore>,
    pub gateway: Arc<MockGateway>,
    pub local: SessionStore,
    pub client: Arc<ChatClient>,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(fast_settings())
    }

    pub fn with_settings(settings: ChatSettings) -> Self {
        Self::with_local(SessionStore::in_memory(), settings)
    }

    /// Build over existing local state, as after a page reload.
    pub fn with_local(local: SessionStore, settings: ChatSettings) -> Self {
        let store = Arc::new(FlakyStore::new());
        let gateway = Arc::new(MockGateway::new());
        Self::assemble(store, gateway, local, settings)
    }

    /// A second tab lifetime over the same store and local state.
    pub fn reload(&self) -> Self {
        self.client.dispose();
        Self::assemble(
            self.store.clone(),
            self.gateway.clone(),
            self.local.clone(),
            fast_settings(),
        )
    }

    fn assemble(
        store: Arc<FlakyStore>,
        gateway: Arc<MockGateway>,
        local: SessionStore,
        settings: ChatSettings,
    ) -> Self {
        let client = Arc::new(ChatClient::new(
            store.clone() as Arc<dyn RealtimeStore>,
            gateway.clone() as Arc<dyn AgentGateway>,
            local.clone(),
            settings,
        ));
        let router = router(AppState::new(client.clone()));
        Self {
            store,
            gateway,
            local,
            client,
            router,
        }
    }

    /// Initialize and log `username` in.
    pub async fn logged_in(&self, username: &str) -> AuthenticatedUser {
        self.client.initialize().await;
        self.client
            .login(&fixtures::token(username))
            .expect("fixture login")
    }

    pub async fn settle(&self) {
        tokio::time::sleep(SETTLE).await;
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
