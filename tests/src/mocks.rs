//! Mock implementations for testing.

use async_trait::async_trait;
use chat_core::error::TurnErrorCode;
use chat_core::{
    AgentReply, AuthenticatedUser, Error, FeedbackRequest, LoginRequest, LoginResponse, Message,
    Result, Session, SessionId, SessionStatus, SurveyRequest, TurnRequest,
};
use parking_lot::Mutex;
use realtime_store::{MemoryStore, MessageSubscription, RealtimeStore};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use webhook_gateway::AgentGateway;

/// Mock agent webhook with scripted replies.
///
/// Implements the same `AgentGateway` trait as the HTTP gateway and records
/// every request so tests can assert on exactly what would have been posted.
#[derive(Clone, Default)]
pub struct MockGateway {
    replies: Arc<Mutex<VecDeque<AgentReply>>>,
    turns: Arc<Mutex<Vec<TurnRequest>>>,
    feedback: Arc<Mutex<Vec<FeedbackRequest>>>,
    surveys: Arc<Mutex<Vec<SurveyRequest>>>,
    logins: Arc<Mutex<Vec<LoginRequest>>>,
    login_token: Arc<Mutex<Option<String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    /// Simulate failures if set.
    should_fail: Arc<Mutex<bool>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain text reply.
    pub fn reply(&self, text: &str) {
        self.reply_with(AgentReply {
            response: text.to_string(),
            ..Default::default()
        });
    }

    pub fn reply_with(&self, reply: AgentReply) {
        self.replies.lock().push_back(reply);
    }

    /// Token handed out by the login endpoint.
    pub fn set_login_token(&self, token: Option<String>) {
        *self.login_token.lock() = token;
    }

    /// Hold every turn for `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    pub fn turns(&self) -> Vec<TurnRequest> {
        self.turns.lock().clone()
    }

    pub fn turn_count(&self) -> usize {
        self.turns.lock().len()
    }

    pub fn feedback(&self) -> Vec<FeedbackRequest> {
        self.feedback.lock().clone()
    }

    pub fn surveys(&self) -> Vec<SurveyRequest> {
        self.surveys.lock().clone()
    }

    pub fn logins(&self) -> Vec<LoginRequest> {
        self.logins.lock().clone()
    }

    fn failing(&self) -> bool {
        *self.should_fail.lock()
    }
}

#[async_trait]
impl AgentGateway for MockGateway {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.logins.lock().push(request.clone());
        if self.failing() {
            return Err(Error::gateway("Mock login failure"));
        }
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

        if self.failing() {
            return Err(Error::turn(TurnErrorCode::DispatchFailed, "Mock turn failure"));
        }
        let next = self.replies.lock().pop_front();
        next.ok_or_else(|| Error::turn(TurnErrorCode::MalformedReply, "no scripted reply"))
    }

    async fn send_feedback(&self, _user: &AuthenticatedUser, request: &FeedbackRequest) -> Result<()> {
        if self.failing() {
            return Err(Error::gateway("Mock feedback failure"));
        }
        self.feedback.lock().push(request.clone());
        Ok(())
    }

    async fn submit_survey(&self, _user: &AuthenticatedUser, request: &SurveyRequest) -> Result<()> {
        if self.failing() {
            return Err(Error::gateway("Mock survey failure"));
        }
        self.surveys.lock().push(request.clone());
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        !self.failing()
    }
}

/// In-memory store that can be told to fail, and that records status updates.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    fail_inserts: Arc<Mutex<bool>>,
    fail_updates: Arc<Mutex<bool>>,
    fail_reads: Arc<Mutex<bool>>,
    insert_delay: Arc<Mutex<Option<Duration>>>,
    status_updates: Arc<Mutex<Vec<(SessionId, SessionStatus)>>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock() = fail;
    }

    pub fn set_fail_updates(&self, fail: bool) {
        *self.fail_updates.lock() = fail;
    }

    /// Hold every session insert for `delay` before writing it.
    pub fn set_insert_delay(&self, delay: Option<Duration>) {
        *self.insert_delay.lock() = delay;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock() = fail;
    }

    /// Every attempted status update, including failed ones.
    pub fn status_updates(&self) -> Vec<(SessionId, SessionStatus)> {
        self.status_updates.lock().clone()
    }

    /// Attempted closes of `id`.
    pub fn close_attempts(&self, id: &SessionId) -> usize {
        self.status_updates
            .lock()
            .iter()
            .filter(|(sid, status)| sid == id && *status == SessionStatus::Closed)
            .count()
    }

    /// Simulate the agent side writing a message.
    pub async fn agent_says(&self, session_id: &SessionId, content: &str) -> Message {
        let message = Message::agent(session_id.clone(), content);
        self.inner
            .insert_message(&message)
            .await
            .expect("insert agent message");
        message
    }
}

#[async_trait]
impl RealtimeStore for FlakyStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        if *self.fail_reads.lock() {
            return Err(Error::store("Mock read failure"));
        }
        self.inner.get_session(id).await
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        if *self.fail_inserts.lock() {
            return Err(Error::store("Mock insert failure"));
        }
        let delay = *self.insert_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.insert_session(session).await
    }

    async fn update_session_status(&self, id: &SessionId, status: SessionStatus) -> Result<()> {
        self.status_updates.lock().push((id.clone(), status));
        if *self.fail_updates.lock() {
            return Err(Error::store("Mock update failure"));
        }
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
        if *self.fail_reads.lock() {
            return Err(Error::store("Mock read failure"));
        }
        self.inner.messages_for_session(id).await
    }

    async fn insert_message(&self, message: &Message) -> Result<()> {
        self.inner.insert_message(message).await
    }

    async fn subscribe_messages(&self, id: &SessionId) -> Result<MessageSubscription> {
        self.inner.subscribe_messages(id).await
    }

    async fn ping(&self) -> Result<()> {
        if *self.fail_reads.lock() {
            return Err(Error::store("Mock ping failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_mock_gateway_scripts_and_records() {
        let mock = MockGateway::new();
        let user = fixtures::user("ana");
        mock.reply("hello");

        let request = TurnRequest::new(&user, "hi", None, chat_core::MessageId::generate());
        let reply = mock.send_turn(&user, &request).await.unwrap();
        assert_eq!(reply.response, "hello");
        assert_eq!(mock.turn_count(), 1);

        // Script exhausted
        let err = mock.send_turn(&user, &request).await.unwrap_err();
        assert_eq!(err.error_code(), "TURN_002");
    }

    #[tokio::test]
    async fn test_flaky_store_records_failed_updates() {
        let store = FlakyStore::new();
        let session = Session::new("ana");
        store.insert_session(&session).await.unwrap();
        store.set_fail_updates(true);

        assert!(store
            .update_session_status(&session.id, SessionStatus::Closed)
            .await
            .is_err());
        assert_eq!(store.close_attempts(&session.id), 1);
        let stored = store.get_session(&session.id).await.unwrap().unwrap();
        assert!(stored.is_active());
    }
}
