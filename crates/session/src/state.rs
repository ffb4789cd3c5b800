//! Chat state: lifecycle phase, transcript and the snapshot handed to the view.

use chat_core::{Message, MessageId, Role, SessionId, TicketId};
use serde::Serialize;

/// Lifecycle phase of the chat view.
///
/// `NoSession -> SessionRequested -> Active -> Locked -> SurveyPending -> NoSession`.
/// `NoSession { expired: true }` is entered through inactivity expiry only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChatPhase {
    NoSession { expired: bool },
    SessionRequested,
    Active,
    Locked,
    SurveyPending,
}

impl ChatPhase {
    /// Locked or waiting for the survey.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Locked | Self::SurveyPending)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl Default for ChatPhase {
    fn default() -> Self {
        Self::NoSession { expired: false }
    }
}

/// Events that end a session. All of them go through one reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatEvent {
    /// A pushed agent message announced the ticket and the closed chat
    TicketClosedByPush,
    /// A turn reply flagged or announced the ticket and the closed chat
    TicketClosedByReply,
    /// The inactivity window elapsed
    InactivityExpired,
}

impl ChatEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TicketClosedByPush => "ticket_closed_by_push",
            Self::TicketClosedByReply => "ticket_closed_by_reply",
            Self::InactivityExpired => "inactivity_expired",
        }
    }
}

/// How a pushed message was folded into the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Appended,
    /// Replaced an unconfirmed local copy
    Merged,
    /// Id already present
    Duplicate,
}

#[derive(Debug, Clone)]
pub(crate) struct TranscriptEntry {
    pub message: Message,
    /// Seen in the store, either loaded or pushed
    pub confirmed: bool,
}

/// Ordered transcript of the current session.
#[derive(Debug, Default, Clone)]
pub(crate) struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn from_store(messages: Vec<Message>) -> Self {
        Self {
            entries: messages
                .into_iter()
                .map(|message| TranscriptEntry {
                    message,
                    confirmed: true,
                })
                .collect(),
        }
    }

    /// Optimistic local insert.
    pub fn push_local(&mut self, message: Message) {
        self.entries.push(TranscriptEntry {
            message,
            confirmed: false,
        });
    }

    /// Fold a pushed row in, reconciling it with optimistic local copies.
    pub fn merge_pushed(&mut self, message: Message) -> PushOutcome {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.message.id == message.id) {
            entry.confirmed = true;
            return PushOutcome::Duplicate;
        }

        // Only the current exchange can hold the local copy: the latest user
        // message for a user echo, anything after it for an agent row.
        let last_user = self
            .entries
            .iter()
            .rposition(|e| e.message.role == Role::User);
        let from = match (&message.role, last_user) {
            (Role::User, Some(i)) => i,
            (_, Some(i)) => i + 1,
            (_, None) => 0,
        };
        if let Some(entry) = self.entries[from..].iter_mut().find(|e| {
            !e.confirmed && e.message.role == message.role && e.message.content == message.content
        }) {
            entry.message = message;
            entry.confirmed = true;
            return PushOutcome::Merged;
        }

        self.entries.push(TranscriptEntry {
            message,
            confirmed: true,
        });
        PushOutcome::Appended
    }

    /// Whether an agent message with `content` already follows `after`.
    /// A push can beat the turn reply that carries the same text.
    pub fn has_agent_reply_after(&self, after: &MessageId, content: &str) -> bool {
        self.entries
            .iter()
            .skip_while(|e| &e.message.id != after)
            .skip(1)
            .any(|e| e.message.role == Role::Agent && e.message.content == content)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable chat state guarded by the controller.
#[derive(Debug, Default)]
pub(crate) struct ChatState {
    pub phase: ChatPhase,
    pub session_id: Option<SessionId>,
    pub ticket_id: Option<TicketId>,
    pub transcript: Transcript,
    pub awaiting_reply: bool,
    pub agent_turns: u32,
    /// Raised after the escalation threshold of agent turns
    pub ticket_prompt: bool,
    /// Raised by a reply's escalation flag
    pub escalation_prompt: bool,
    pub disposed: bool,
    /// Bumped whenever the session context changes; stale work compares it.
    pub generation: u64,
}

impl ChatState {
    /// Start a new session context. Everything session-scoped resets.
    pub fn begin(&mut self, phase: ChatPhase, session_id: Option<SessionId>, transcript: Transcript) {
        self.phase = phase;
        self.session_id = session_id;
        self.transcript = transcript;
        self.awaiting_reply = false;
        self.agent_turns = 0;
        self.ticket_prompt = false;
        self.escalation_prompt = false;
        self.generation += 1;
    }

    pub fn clear_prompts(&mut self) {
        self.ticket_prompt = false;
        self.escalation_prompt = false;
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let rateable = self.phase.is_active();
        ChatSnapshot {
            phase: self.phase,
            session_id: self.session_id.clone(),
            ticket_id: self.ticket_id.clone(),
            messages: self
                .transcript
                .entries()
                .iter()
                .map(|e| MessageView {
                    can_rate: rateable && e.message.role == Role::Agent && !e.message.is_closing(),
                    confirmed: e.confirmed,
                    message: e.message.clone(),
                })
                .collect(),
            awaiting_reply: self.awaiting_reply,
            agent_turns: self.agent_turns,
            ticket_prompt: self.ticket_prompt,
            escalation_prompt: self.escalation_prompt,
        }
    }
}

/// One transcript line as the view renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub confirmed: bool,
    /// Show feedback and satisfaction controls
    pub can_rate: bool,
}

/// Read-only copy of the chat state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSnapshot {
    pub phase: ChatPhase,
    pub session_id: Option<SessionId>,
    pub ticket_id: Option<TicketId>,
    pub messages: Vec<MessageView>,
    pub awaiting_reply: bool,
    pub agent_turns: u32,
    pub ticket_prompt: bool,
    pub escalation_prompt: bool,
}

impl ChatSnapshot {
    /// Input is disabled while a reply is pending or once the session closed.
    pub fn input_locked(&self) -> bool {
        self.awaiting_reply || !self.phase.is_active()
    }
}
