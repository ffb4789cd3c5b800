//! Tab-scoped local state and its storage keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{SessionId, TicketId};

/// Stored credential.
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Last user activity, epoch millis.
pub const LAST_ACTIVITY_KEY: &str = "lastActivity";
/// Current session id.
pub const SESSION_ID_KEY: &str = "chat_id";
/// Ticket id remembered for the survey.
pub const TICKET_ID_KEY: &str = "ticket_id";

/// Keys cleared when a session ends but the user stays logged in.
pub const SESSION_SCOPED_KEYS: [&str; 2] = [SESSION_ID_KEY, TICKET_ID_KEY];

/// Snapshot of the persisted local state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSessionState {
    pub session_id: Option<SessionId>,
    pub ticket_id: Option<TicketId>,
    pub last_activity: Option<DateTime<Utc>>,
    pub auth_token: Option<String>,
}
