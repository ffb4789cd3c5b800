//! Unified error types for the support-chat client.
//!
//! Error codes:
//! - AUTH_001-004: Authentication errors
//! - SESSION_001-004: Session lifecycle errors
//! - TURN_001-003: Turn dispatch errors
//! - STORE_001: Real-time store errors
//! - GATEWAY_001: Webhook errors outside of chat turns
//! - VALID_001: Validation errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// AUTH_001: No credential present
    MissingCredential,
    /// AUTH_002: Credential could not be decoded
    InvalidCredential,
    /// AUTH_003: Auth endpoint rejected the login
    LoginRejected,
    /// AUTH_004: Caller is not authenticated
    Unauthenticated,
}

impl AuthErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "AUTH_001",
            Self::InvalidCredential => "AUTH_002",
            Self::LoginRejected => "AUTH_003",
            Self::Unauthenticated => "AUTH_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        401
    }
}

/// Session lifecycle error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorCode {
    /// SESSION_001: Remote session insert failed
    CreateFailed,
    /// SESSION_002: No active session
    NoActiveSession,
    /// SESSION_003: Session is locked
    Locked,
    /// SESSION_004: A session is already being created
    CreateInProgress,
}

impl SessionErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CreateFailed => "SESSION_001",
            Self::NoActiveSession => "SESSION_002",
            Self::Locked => "SESSION_003",
            Self::CreateInProgress => "SESSION_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::CreateFailed => 502,
            Self::NoActiveSession => 409,
            Self::Locked => 409,
            Self::CreateInProgress => 409,
        }
    }

    /// Whether re-invoking the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CreateFailed)
    }
}

/// Turn dispatch error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnErrorCode {
    /// TURN_001: Network or remote failure during a turn
    DispatchFailed,
    /// TURN_002: Reply payload could not be normalized
    MalformedReply,
    /// TURN_003: A turn is already awaiting its reply
    InFlight,
}

impl TurnErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DispatchFailed => "TURN_001",
            Self::MalformedReply => "TURN_002",
            Self::InFlight => "TURN_003",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InFlight => 409,
            _ => 502,
        }
    }
}

/// Unified error type for the support-chat client.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication error with code.
    #[error("[{code}] {message}")]
    Auth {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Session lifecycle error with code.
    #[error("[{code}] {message}")]
    Session {
        code: &'static str,
        message: String,
        http_status: u16,
        retryable: bool,
    },

    /// Turn dispatch error with code. Always transient from the user's view.
    #[error("[{code}] {message}")]
    Turn {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("[STORE_001] store error: {0}")]
    Store(String),

    #[error("[GATEWAY_001] gateway error: {0}")]
    Gateway(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an authentication error.
    pub fn auth(code: AuthErrorCode, msg: impl Into<String>) -> Self {
        Self::Auth {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a session lifecycle error.
    pub fn session(code: SessionErrorCode, msg: impl Into<String>) -> Self {
        Self::Session {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
            retryable: code.is_retryable(),
        }
    }

    /// Create a turn dispatch error.
    pub fn turn(code: TurnErrorCode, msg: impl Into<String>) -> Self {
        Self::Turn {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Auth { http_status, .. } => *http_status,
            Self::Session { http_status, .. } => *http_status,
            Self::Turn { http_status, .. } => *http_status,
            Self::Store(_) => 502,
            Self::Gateway(_) => 502,
            Self::Validation(_) => 400,
            Self::Serialization(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth { code, .. } => code,
            Self::Session { code, .. } => code,
            Self::Turn { code, .. } => code,
            Self::Store(_) => "STORE_001",
            Self::Gateway(_) => "GATEWAY_001",
            Self::Validation(_) | Self::Serialization(_) => "VALID_001",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the caller may retry the same operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Session { retryable, .. } => *retryable,
            Self::Turn { .. } | Self::Store(_) | Self::Gateway(_) => true,
            _ => false,
        }
    }
}
