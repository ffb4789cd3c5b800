//! Remote sync listener.
//!
//! One listener per active session id. It folds pushed messages into the
//! transcript and watches them for the terminal markers. Dropping the
//! listener ends the subscription.

use chat_core::{Message, Result, SessionId};
use realtime_store::MessageSubscription;
use std::sync::Weak;
use telemetry::metrics;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::controller::{ChatController, Inner};
use crate::state::{ChatEvent, PushOutcome};

pub(crate) struct RemoteSyncListener {
    session_id: SessionId,
    task: JoinHandle<()>,
}

impl RemoteSyncListener {
    pub(crate) async fn attach(controller: &ChatController, session_id: SessionId) -> Result<Self> {
        let subscription = controller
            .inner
            .store
            .subscribe_messages(&session_id)
            .await?;
        Ok(Self::spawn(controller, session_id, subscription))
    }

    /// Drain an already open subscription. Rows buffered before the
    /// transcript was loaded are folded in like any other push.
    pub(crate) fn spawn(
        controller: &ChatController,
        session_id: SessionId,
        mut subscription: MessageSubscription,
    ) -> Self {
        let weak: Weak<Inner> = controller.downgrade();
        let id = session_id.clone();

        let task = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                on_pushed(&ChatController::from_inner(inner), &id, message);
            }
            debug!(session_id = %id, "Message feed ended");
        });

        Self { session_id, task }
    }

    pub(crate) fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl Drop for RemoteSyncListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Apply one pushed message. Pushes for a session that is no longer
/// current are ignored.
fn on_pushed(controller: &ChatController, session_id: &SessionId, message: Message) {
    let terminal = message.is_terminal();
    let outcome = {
        let mut st = controller.inner.state.lock();
        if st.disposed || !st.phase.is_active() || st.session_id.as_ref() != Some(session_id) {
            debug!(session_id = %session_id, "Ignoring push for stale session");
            return;
        }
        st.transcript.merge_pushed(message)
    };

    metrics().messages_pushed.inc();
    match outcome {
        PushOutcome::Appended => {}
        PushOutcome::Merged => metrics().echoes_merged.inc(),
        PushOutcome::Duplicate => return,
    }

    if terminal {
        info!(session_id = %session_id, "Pushed message closes the session");
        controller.schedule(
            ChatEvent::TicketClosedByPush,
            controller.settings().push_close_delay(),
        );
    }
}
