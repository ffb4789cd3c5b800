//! Session and message records as persisted in the real-time store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::limits::{CHAT_CLOSED_MARKER, CLOSING_FRAGMENTS, TICKET_CREATED_MARKER};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh client-side identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a chat session. The remote agent may assign or rename it.
    SessionId
);
opaque_id!(
    /// Identifier of a message row.
    MessageId
);
opaque_id!(
    /// Identifier of a ticket filed by the agent.
    TicketId
);

/// Remote session status. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

/// A support conversation. Never deleted, only closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Username of the owning user
    pub owner: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new active session with a generated id.
    pub fn new(owner: impl Into<String>) -> Self {
        Self::with_id(SessionId::generate(), owner)
    }

    /// Creates a new active session with a known id.
    pub fn with_id(id: SessionId, owner: impl Into<String>) -> Self {
        Self {
            id,
            owner: owner.into(),
            status: SessionStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Last eight characters of the id, uppercased. Used as a display label.
    pub fn short_id(&self) -> String {
        let id = self.id.as_str();
        let start = id
            .char_indices()
            .rev()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(0);
        id[start..].to_uppercase()
    }
}

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant", alias = "agent")]
    Agent,
}

/// One message of a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(session_id: SessionId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            session_id,
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::User, content)
    }

    pub fn agent(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::Agent, content)
    }

    /// Agent message announcing a filed ticket and a closed chat.
    pub fn is_terminal(&self) -> bool {
        self.role == Role::Agent && is_terminal_content(&self.content)
    }

    /// Closing notices get no rating controls.
    pub fn is_closing(&self) -> bool {
        is_closing_content(&self.content)
    }
}

/// True when content carries both the ticket-created and chat-closed markers.
pub fn is_terminal_content(content: &str) -> bool {
    let lower = content.to_lowercase();
    lower.contains(TICKET_CREATED_MARKER) && lower.contains(CHAT_CLOSED_MARKER)
}

/// True when content contains any closing fragment.
pub fn is_closing_content(content: &str) -> bool {
    let lower = content.to_lowercase();
    CLOSING_FRAGMENTS.iter().any(|f| lower.contains(f))
}
