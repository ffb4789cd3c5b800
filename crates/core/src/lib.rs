//! Core types, credential decoding, and reply normalization for the support-chat client.

pub mod error;
pub mod identity;
pub mod limits;
pub mod local;
pub mod payload;
pub mod reply;
pub mod session;

pub use error::{Error, Result};
pub use identity::*;
pub use local::LocalSessionState;
pub use payload::*;
pub use reply::AgentReply;
pub use session::*;
