//! In-process store backend.
//!
//! Used for local runs and tests. Inserts fan out to subscribers through a
//! broadcast channel; each subscription filters by session id.

use async_trait::async_trait;
use chat_core::{Error, Message, Result, Session, SessionId, SessionStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::store::RealtimeStore;
use crate::subscription::{MessageSubscription, SUBSCRIPTION_BUFFER};

/// Capacity of the insert notification channel.
const NOTIFY_CAPACITY: usize = 256;

pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    messages: RwLock<Vec<Message>>,
    inserted_tx: broadcast::Sender<Message>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (inserted_tx, _rx) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            sessions: RwLock::new(HashMap::new()),
            messages: RwLock::new(Vec::new()),
            inserted_tx,
        }
    }

    /// Number of stored sessions with `status`.
    pub fn count_with_status(&self, status: SessionStatus) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|s| s.status == status)
            .count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("sessions", &self.sessions.read().len())
            .field("messages", &self.messages.read().len())
            .finish()
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.read().get(id).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.id) {
            return Err(Error::store(format!("session {} already exists", session.id)));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn update_session_status(&self, id: &SessionId, status: SessionStatus) -> Result<()> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| Error::store(format!("session {} not found", id)))?;

        if session.status == SessionStatus::Closed {
            debug!(session_id = %id, "Session already closed, status unchanged");
            return Ok(());
        }
        session.status = status;
        Ok(())
    }

    async fn sessions_for_owner(
        &self,
        owner: &str,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.owner == owner && status.map_or(true, |st| s.status == st))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn messages_for_session(&self, id: &SessionId) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .messages
            .read()
            .iter()
            .filter(|m| &m.session_id == id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn insert_message(&self, message: &Message) -> Result<()> {
        {
            let mut messages = self.messages.write();
            if messages.iter().any(|m| m.id == message.id) {
                return Err(Error::store(format!("message {} already exists", message.id)));
            }
            messages.push(message.clone());
        }

        if self.inserted_tx.send(message.clone()).is_err() {
            debug!("No subscribers for message insert");
        }
        Ok(())
    }

    async fn subscribe_messages(&self, id: &SessionId) -> Result<MessageSubscription> {
        let mut inserted_rx = self.inserted_tx.subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let session_id = id.clone();

        let task = tokio::spawn(async move {
            loop {
                match inserted_rx.recv().await {
                    Ok(message) if message.session_id == session_id => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(session_id = %session_id, skipped, "Subscription lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(MessageSubscription::new(id.clone(), rx, task))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
