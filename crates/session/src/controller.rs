//! Chat lifecycle controller.
//!
//! Owns the chat state machine. Turn replies and pushed messages both end
//! up in [`ChatController::apply`], which is idempotent: only the first
//! terminal event for a session has any effect.

use chat_core::error::SessionErrorCode;
use chat_core::{AuthenticatedUser, Error, Result, Session, SessionId};
use parking_lot::Mutex;
use realtime_store::RealtimeStore;
use std::sync::{Arc, Weak};
use std::time::Duration;
use telemetry::metrics;
use tracing::{debug, info, warn};
use webhook_gateway::AgentGateway;

use crate::closure::close_remote;
use crate::config::ChatSettings;
use crate::listener::RemoteSyncListener;
use crate::state::{ChatEvent, ChatPhase, ChatSnapshot, ChatState, Transcript};
use crate::storage::SessionStore;

pub(crate) struct Inner {
    pub(crate) store: Arc<dyn RealtimeStore>,
    pub(crate) gateway: Arc<dyn AgentGateway>,
    pub(crate) local: SessionStore,
    pub(crate) settings: ChatSettings,
    pub(crate) state: Mutex<ChatState>,
    listener: Mutex<Option<RemoteSyncListener>>,
}

/// Handle to the chat state machine. Clones share state.
#[derive(Clone)]
pub struct ChatController {
    pub(crate) inner: Arc<Inner>,
}

impl ChatController {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        gateway: Arc<dyn AgentGateway>,
        local: SessionStore,
        settings: ChatSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                gateway,
                local,
                settings,
                state: Mutex::new(ChatState::default()),
                listener: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.inner.settings
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.inner.state.lock().snapshot()
    }

    pub fn phase(&self) -> ChatPhase {
        self.inner.state.lock().phase
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.state.lock().session_id.clone()
    }

    /// Whether a listener is attached for `id`.
    pub fn is_listening(&self, id: &SessionId) -> bool {
        self.inner
            .listener
            .lock()
            .as_ref()
            .is_some_and(|l| l.session_id() == id)
    }

    /// Create a new session for `user`.
    ///
    /// The remote insert happens before any local change. On failure the
    /// previous state is restored and SESSION_001 is returned. A previously
    /// active session is closed once the new one exists. If a logout or
    /// expiry lands while the insert is pending, the new session is closed
    /// and local state is left as that transition set it.
    pub async fn start(&self, user: &AuthenticatedUser) -> Result<SessionId> {
        let (previous_phase, previous_active, generation) = {
            let mut st = self.inner.state.lock();
            if st.disposed {
                return Err(Error::internal("chat controller disposed"));
            }
            if st.phase == ChatPhase::SessionRequested {
                return Err(Error::session(
                    SessionErrorCode::CreateInProgress,
                    "a session is already being created",
                ));
            }
            let phase = std::mem::replace(&mut st.phase, ChatPhase::SessionRequested);
            let active = if phase.is_active() {
                st.session_id.clone()
            } else {
                None
            };
            (phase, active, st.generation)
        };

        let session = Session::new(user.username());
        if let Err(e) = self.inner.store.insert_session(&session).await {
            metrics().session_start_failures.inc();
            warn!(error = %e, "Session insert failed");
            let mut st = self.inner.state.lock();
            if st.generation == generation && st.phase == ChatPhase::SessionRequested {
                st.phase = previous_phase;
            }
            return Err(Error::session(
                SessionErrorCode::CreateFailed,
                format!("failed to create session: {}", e),
            ));
        }

        let superseded = {
            let mut st = self.inner.state.lock();
            if st.disposed || st.generation != generation {
                true
            } else {
                st.begin(ChatPhase::Active, Some(session.id.clone()), Transcript::default());
                st.ticket_id = None;
                false
            }
        };
        if superseded {
            warn!(session_id = %session.id, "Session context changed during create");
            close_remote(self.inner.store.as_ref(), &session.id, "superseded").await;
            return Err(Error::session(
                SessionErrorCode::CreateFailed,
                "session context changed while the session was being created",
            ));
        }

        self.persist(|local| {
            local.clear_session_keys()?;
            local.set_session_id(&session.id)
        });

        if let Some(ref prior) = previous_active {
            close_remote(self.inner.store.as_ref(), prior, "replaced").await;
        }

        metrics().sessions_started.inc();
        info!(session_id = %session.id, owner = %session.owner, "Session started");

        self.attach_listener(session.id.clone()).await;
        Ok(session.id)
    }

    /// Page load: resume the stored session if there is nothing in memory.
    pub async fn resume(&self, user: &AuthenticatedUser) -> ChatSnapshot {
        let in_memory = {
            let st = self.inner.state.lock();
            !matches!(st.phase, ChatPhase::NoSession { .. })
        };
        if !in_memory {
            if let Some(id) = self.inner.local.session_id() {
                self.validate_existing(user, &id).await;
            }
        }
        self.snapshot()
    }

    /// Check a stored session against the store.
    ///
    /// A missing, closed, foreign or unreadable session silently becomes
    /// `NoSession`. A valid one becomes `Active` with its transcript loaded.
    pub async fn validate_existing(&self, user: &AuthenticatedUser, id: &SessionId) -> bool {
        let session = match self.inner.store.get_session(id).await {
            Ok(Some(session)) if session.is_active() && session.owner == user.username() => session,
            Ok(Some(session)) => {
                debug!(session_id = %id, status = session.status.as_str(), "Stored session not usable");
                self.downgrade_stored(id);
                return false;
            }
            Ok(None) => {
                debug!(session_id = %id, "Stored session not found");
                self.downgrade_stored(id);
                return false;
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Session lookup failed");
                self.downgrade_stored(id);
                return false;
            }
        };

        // Subscribe before loading so rows written in between are not lost
        let subscription = match self.inner.store.subscribe_messages(&session.id).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to subscribe to messages");
                None
            }
        };

        let messages = match self.inner.store.messages_for_session(&session.id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(session_id = %id, error = %e, "Transcript load failed");
                self.downgrade_stored(id);
                return false;
            }
        };

        {
            let mut st = self.inner.state.lock();
            if st.disposed {
                return false;
            }
            st.begin(
                ChatPhase::Active,
                Some(session.id.clone()),
                Transcript::from_store(messages),
            );
            st.ticket_id = self.inner.local.ticket_id();
        }

        debug!(session_id = %session.id, "Resumed session");
        if let Some(subscription) = subscription {
            let listener = RemoteSyncListener::spawn(self, session.id.clone(), subscription);
            self.install_listener(listener);
        }
        true
    }

    fn downgrade_stored(&self, id: &SessionId) {
        {
            let mut st = self.inner.state.lock();
            if st.session_id.as_ref().is_some_and(|current| current != id) {
                return;
            }
            st.begin(ChatPhase::NoSession { expired: false }, None, Transcript::default());
        }
        self.persist(|local| local.remove_session_id());
    }

    /// The single reducer for session-ending events.
    ///
    /// Returns whether the event changed anything.
    pub async fn apply(&self, event: ChatEvent) -> bool {
        match event {
            ChatEvent::TicketClosedByPush | ChatEvent::TicketClosedByReply => self.lock(event).await,
            ChatEvent::InactivityExpired => self.expire().await,
        }
    }

    async fn lock(&self, event: ChatEvent) -> bool {
        let (session_id, generation) = {
            let mut st = self.inner.state.lock();
            if st.disposed || !st.phase.is_active() {
                return false;
            }
            st.phase = ChatPhase::Locked;
            st.awaiting_reply = false;
            st.clear_prompts();
            st.generation += 1;
            (st.session_id.take(), st.generation)
        };

        self.detach_listener();
        self.persist(|local| local.remove_session_id());
        metrics().sessions_locked.inc();
        info!(reason = event.as_str(), "Session locked");

        if let Some(ref id) = session_id {
            close_remote(self.inner.store.as_ref(), id, event.as_str()).await;
        }

        let weak = self.downgrade();
        let delay = self.inner.settings.survey_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else { return };
            let mut st = inner.state.lock();
            if st.generation == generation && st.phase == ChatPhase::Locked {
                st.phase = ChatPhase::SurveyPending;
                debug!("Survey pending");
            }
        });
        true
    }

    async fn expire(&self) -> bool {
        let in_memory = {
            let mut st = self.inner.state.lock();
            if st.disposed || st.phase == (ChatPhase::NoSession { expired: true }) {
                return false;
            }
            let id = st.session_id.clone();
            st.begin(ChatPhase::NoSession { expired: true }, None, Transcript::default());
            st.ticket_id = None;
            id
        };
        let session_id = in_memory.or_else(|| self.inner.local.session_id());

        self.detach_listener();
        self.persist(|local| local.clear_session_keys());
        metrics().sessions_expired.inc();
        info!("Session expired after inactivity");

        if let Some(ref id) = session_id {
            close_remote(self.inner.store.as_ref(), id, ChatEvent::InactivityExpired.as_str()).await;
        }
        true
    }

    /// Run `event` after `delay` unless the session context changed meanwhile.
    pub(crate) fn schedule(&self, event: ChatEvent, delay: Duration) {
        let generation = self.inner.state.lock().generation;
        let weak = self.downgrade();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else { return };
            let controller = ChatController::from_inner(inner);
            if controller.inner.state.lock().generation != generation {
                debug!(reason = event.as_str(), "Scheduled event superseded");
                return;
            }
            controller.apply(event).await;
        });
    }

    /// Subscribe to pushes for `id`, replacing any previous listener.
    pub(crate) async fn attach_listener(&self, id: SessionId) {
        match RemoteSyncListener::attach(self, id.clone()).await {
            Ok(listener) => self.install_listener(listener),
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to subscribe to messages");
            }
        }
    }

    fn install_listener(&self, listener: RemoteSyncListener) {
        let current = self.inner.state.lock().session_id.clone();
        if current.as_ref() != Some(listener.session_id()) {
            debug!(session_id = %listener.session_id(), "Session changed while subscribing");
            return;
        }
        *self.inner.listener.lock() = Some(listener);
    }

    pub(crate) fn detach_listener(&self) {
        let listener = self.inner.listener.lock().take();
        drop(listener);
    }

    /// Forget the in-memory session without touching storage or the store.
    pub fn detach(&self) {
        self.detach_listener();
        let mut st = self.inner.state.lock();
        st.begin(ChatPhase::NoSession { expired: false }, None, Transcript::default());
        st.ticket_id = None;
    }

    /// Show the expired state after the login layer already closed the
    /// session and cleared storage.
    pub fn mark_expired(&self) {
        self.detach_listener();
        let mut st = self.inner.state.lock();
        st.begin(ChatPhase::NoSession { expired: true }, None, Transcript::default());
        st.ticket_id = None;
    }

    /// Tear down; results of in-flight work are discarded afterwards.
    pub fn dispose(&self) {
        self.detach();
        self.inner.state.lock().disposed = true;
        debug!("Chat controller disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    pub(crate) fn persist(&self, f: impl FnOnce(&SessionStore) -> Result<()>) {
        if let Err(e) = f(&self.inner.local) {
            warn!(error = %e, "Failed to persist local session state");
        }
    }
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.inner.state.lock();
        f.debug_struct("ChatController")
            .field("phase", &st.phase)
            .field("session_id", &st.session_id)
            .finish()
    }
}
