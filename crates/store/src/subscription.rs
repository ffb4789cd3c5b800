//! Message subscriptions.

use chat_core::{Message, SessionId};
use telemetry::metrics;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Buffered messages per subscription before the feeding task waits.
pub const SUBSCRIPTION_BUFFER: usize = 64;

/// Live feed of messages inserted into one session.
///
/// Dropping the subscription stops the feeding task.
pub struct MessageSubscription {
    session_id: SessionId,
    rx: mpsc::Receiver<Message>,
    task: JoinHandle<()>,
}

impl MessageSubscription {
    pub fn new(session_id: SessionId, rx: mpsc::Receiver<Message>, task: JoinHandle<()>) -> Self {
        metrics().active_subscriptions.inc();
        debug!(session_id = %session_id, "Subscribed to messages");
        Self {
            session_id,
            rx,
            task,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Next pushed message; `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

impl Drop for MessageSubscription {
    fn drop(&mut self) {
        self.task.abort();
        metrics().active_subscriptions.dec();
        debug!(session_id = %self.session_id, "Unsubscribed from messages");
    }
}

impl std::fmt::Debug for MessageSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSubscription")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
