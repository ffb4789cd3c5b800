//! Stubs shared by the unit tests of this crate.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chat_core::{
    AgentReply, AuthenticatedUser, Credential, Error, FeedbackRequest, LoginRequest,
    LoginResponse, Message, Result, Session, SessionId, SessionStatus, SurveyRequest,
    TurnRequest,
};
use parking_lot::Mutex;
use realtime_store::{MemoryStore, MessageSubscription, RealtimeStore};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use webhook_gateway::AgentGateway;

use crate::config::ChatSettings;
use crate::controller::ChatController;
use crate::storage::SessionStore;

pub fn token(username: &str, exp: Option<i64>) -> String {
    let claims = serde_json::json!({
        "username": username,
        "name": "Test User",
        "email": format!("{}@example.com", username),
        "exp": exp,
    });
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.sig",
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

pub fn user(username: &str) -> AuthenticatedUser {
    AuthenticatedUser::new(Credential::decode(&token(username, None)).unwrap())
}

/// Fast timings so scheduled transitions happen within a test.
pub fn fast_settings() -> ChatSettings {
    ChatSettings {
        reply_close_delay_ms: 20,
        push_close_delay_ms: 20,
        survey_delay_ms: 20,
        ..ChatSettings::default()
    }
}

#[derive(Default)]
pub struct StubGateway {
    pub replies: Mutex<VecDeque<Result<AgentReply>>>,
    pub turns: Mutex<Vec<TurnRequest>>,
    pub surveys: Mutex<Vec<SurveyRequest>>,
    pub feedback: Mutex<Vec<FeedbackRequest>>,
    pub login_token: Mutex<Option<String>>,
    pub delay: Mutex<Option<Duration>>,
    pub fail_side_calls: Mutex<bool>,
}

impl StubGateway {
    pub fn reply(&self, text: &str) {
        self.replies.lock().push_back(Ok(AgentReply {
            response: text.to_string(),
            ..Default::default()
        }));
    }

    pub fn push(&self, reply: Result<AgentReply>) {
        self.replies.lock().push_back(reply);
    }

    pub fn turn_count(&self) -> usize {
        self.turns.lock().len()
    }
}

#[async_trait]
impl AgentGateway for StubGateway {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse> {
        Ok(LoginResponse {
            token: self.login_token.lock().clone(),
        })
    }

    async fn send_turn(&self, _user: &AuthenticatedUser, request: &TurnRequest) -> Result<AgentReply> {
        self.turns.lock().push(request.clone());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().pop_front();
        next.unwrap_or_else(|| Err(Error::gateway("no scripted reply")))
    }

    async fn send_feedback(&self, _user: &AuthenticatedUser, request: &FeedbackRequest) -> Result<()> {
        if *self.fail_side_calls.lock() {
            return Err(Error::gateway("feedback endpoint down"));
        }
        self.feedback.lock().push(request.clone());
        Ok(())
    }

    async fn submit_survey(&self, _user: &AuthenticatedUser, request: &SurveyRequest) -> Result<()> {
        if *self.fail_side_calls.lock() {
            return Err(Error::gateway("survey endpoint down"));
        }
        self.surveys.lock().push(request.clone());
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<StubGateway>,
    pub local: SessionStore,
    pub controller: ChatController,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(StubGateway::default());
    let local = SessionStore::in_memory();
    let controller = ChatController::new(store.clone(), gateway.clone(), local.clone(), fast_settings());
    Harness {
        store,
        gateway,
        local,
        controller,
    }
}

/// Memory store with a slow session insert and an optional row written
/// right after a transcript load.
#[derive(Default)]
pub struct TimedStore {
    pub inner: MemoryStore,
    pub insert_delay: Mutex<Option<Duration>>,
    pub write_after_load: Mutex<Option<Message>>,
}

#[async_trait]
impl RealtimeStore for TimedStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        self.inner.get_session(id).await
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        let delay = *self.insert_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.insert_session(session).await
    }

    async fn update_session_status(&self, id: &SessionId, status: SessionStatus) -> Result<()> {
        self.inner.update_session_status(id, status).await
    }

    async fn sessions_for_owner(
        &self,
        owner: &str,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>> {
        self.inner.sessions_for_owner(owner, status).await
    }

    async fn messages_for_session(&self, id: &SessionId) -> Result<Vec<Message>> {
        let messages = self.inner.messages_for_session(id).await?;
        let late = self.write_after_load.lock().take();
        if let Some(late) = late {
            self.inner.insert_message(&late).await?;
        }
        Ok(messages)
    }

    async fn insert_message(&self, message: &Message) -> Result<()> {
        self.inner.insert_message(message).await
    }

    async fn subscribe_messages(&self, id: &SessionId) -> Result<MessageSubscription> {
        self.inner.subscribe_messages(id).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

pub fn timed_controller(store: Arc<TimedStore>, local: SessionStore) -> ChatController {
    ChatController::new(store, Arc::new(StubGateway::default()), local, fast_settings())
}
