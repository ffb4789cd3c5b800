//! Timing constants, thresholds, and content markers for the chat lifecycle.
//!
//! The delays are user-visible: a closing agent message gets time to render
//! before input locks, and the lock gets time to render before the survey.
//! `ChatSettings` in the session crate carries overridable copies of these.

// === Activity ===

/// Inactivity window after which a session is considered expired (10 minutes).
pub const INACTIVITY_TIMEOUT_SECS: u64 = 10 * 60;

// === Lock sequencing ===

/// Delay between a terminal turn reply and the lock (ms).
pub const REPLY_CLOSE_DELAY_MS: u64 = 2_500;

/// Delay between a terminal pushed message and the lock (ms).
pub const PUSH_CLOSE_DELAY_MS: u64 = 2_000;

/// Delay between the lock and the survey prompt (ms).
pub const SURVEY_DELAY_MS: u64 = 2_000;

// === Escalation ===

/// Agent turns without closure before the "create ticket?" prompt is raised.
pub const ESCALATION_TURN_THRESHOLD: u32 = 5;

// === Terminal markers ===

/// Agent content marker for a filed ticket.
pub const TICKET_CREATED_MARKER: &str = "ticket has been created successfully";

/// Agent content marker for a closed chat.
pub const CHAT_CLOSED_MARKER: &str = "chat has been closed";

/// Fragments that mark a message as a closing notice (no rating controls).
pub const CLOSING_FRAGMENTS: [&str; 3] = [
    "chat has been closed",
    "ticket has been created",
    "successfully and the chat",
];

// === Canned utterances ===

/// Utterance sent when the user asks for a ticket.
pub const CREATE_TICKET_UTTERANCE: &str = "create a ticket";

/// Utterance sent when the user reports being satisfied.
pub const SATISFIED_UTTERANCE: &str = "Yes, I am satisfied with the response.";

/// Utterance sent when the user reports not being satisfied.
pub const NOT_SATISFIED_UTTERANCE: &str =
    "No, I am not satisfied. I need more assistance with my issue.";

// === Field limits ===

/// Maximum utterance length (chars).
pub const MAX_UTTERANCE_LEN: usize = 4_000;

/// Maximum survey notes length (chars).
pub const MAX_SURVEY_NOTES_LEN: u64 = 2_000;

/// Survey rating bounds (inclusive).
pub const MIN_SURVEY_RATING: u8 = 1;
pub const MAX_SURVEY_RATING: u8 = 5;

// === Credential ===

/// Credential shape: three base64url segments separated by dots.
pub const CREDENTIAL_PATTERN: &str = r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*$";
