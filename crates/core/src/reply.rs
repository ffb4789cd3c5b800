//! Chat-turn reply normalization.
//!
//! The agent webhook answers a turn with either one JSON object or an array
//! holding exactly one object. Both shapes normalize to `AgentReply`;
//! anything else is a malformed reply (TURN_002).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result, TurnErrorCode};
use crate::session::{is_terminal_content, SessionId, TicketId};

/// Normalized agent reply for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub response: String,
    pub session_id: Option<SessionId>,
    pub ticket_id: Option<TicketId>,
    pub ticket_created: bool,
    pub escalation: bool,
}

/// Reply as sent over the wire. Field spellings vary between agent flows.
#[derive(Deserialize)]
struct RawReply {
    response: Option<Value>,
    #[serde(default, alias = "sessionId", alias = "chat_id", alias = "chatId")]
    session_id: Option<Value>,
    #[serde(default, alias = "ticketId")]
    ticket_id: Option<Value>,
    #[serde(default, alias = "ticketCreated")]
    ticket_created: Option<Value>,
    #[serde(default)]
    escalation: Option<Value>,
}

impl AgentReply {
    /// Parse a reply from raw response bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| malformed(format!("reply is not JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Normalize an already-decoded reply value.
    pub fn from_value(value: Value) -> Result<Self> {
        let object = match value {
            Value::Object(_) => value,
            Value::Array(mut items) => {
                if items.len() != 1 {
                    return Err(malformed(format!(
                        "reply array must hold exactly one object, got {}",
                        items.len()
                    )));
                }
                let item = items.remove(0);
                if !item.is_object() {
                    return Err(malformed("reply array element is not an object"));
                }
                item
            }
            other => {
                return Err(malformed(format!(
                    "reply must be an object, got {}",
                    kind(&other)
                )))
            }
        };

        let raw: RawReply = serde_json::from_value(object)
            .map_err(|e| malformed(format!("invalid reply object: {}", e)))?;

        let response = match raw.response {
            Some(Value::String(s)) => s,
            Some(other) => return Err(malformed(format!("response must be text, got {}", kind(&other)))),
            None => return Err(malformed("reply has no response")),
        };

        Ok(Self {
            response,
            session_id: identifier(raw.session_id).map(SessionId::new),
            ticket_id: identifier(raw.ticket_id).map(TicketId::new),
            ticket_created: flag(raw.ticket_created),
            escalation: flag(raw.escalation),
        })
    }

    /// Whether this reply closes the session: explicit flag or both markers.
    pub fn is_terminal(&self) -> bool {
        self.ticket_created || is_terminal_content(&self.response)
    }
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::turn(TurnErrorCode::MalformedReply, msg)
}

/// Strings and numbers are accepted as identifiers; null or blank is absent.
fn identifier(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(value: Option<Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
