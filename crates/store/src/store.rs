//! Store interface shared by every backend.

use async_trait::async_trait;
use chat_core::{Message, Result, Session, SessionId, SessionStatus};

use crate::subscription::MessageSubscription;

/// Hosted relational store with change notifications.
///
/// Two collections: sessions and their messages. Sessions are never
/// deleted; a closed session is immutable.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Point read of a session.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>>;

    async fn insert_session(&self, session: &Session) -> Result<()>;

    /// Move a session to `status`. Updating a closed session is a no-op.
    async fn update_session_status(&self, id: &SessionId, status: SessionStatus) -> Result<()>;

    /// Sessions of one owner, newest first, optionally filtered by status.
    async fn sessions_for_owner(
        &self,
        owner: &str,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>>;

    /// Messages of a session, ascending by creation time.
    async fn messages_for_session(&self, id: &SessionId) -> Result<Vec<Message>>;

    async fn insert_message(&self, message: &Message) -> Result<()>;

    /// Push messages inserted into `id` after this call returns.
    async fn subscribe_messages(&self, id: &SessionId) -> Result<MessageSubscription>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<()>;
}
