//! Chat session lifecycle for the support-chat client.
//!
//! Provides:
//! - Persisted local state (`storage`)
//! - Activity tracking and login restore (`activity`, `auth`)
//! - The chat state machine with its push listener and turn dispatcher
//! - Feedback, survey and history

pub mod activity;
pub mod auth;
pub mod client;
pub mod closure;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod feedback;
pub mod history;
mod listener;
pub mod state;
pub mod storage;
pub mod survey;

#[cfg(test)]
mod test_support;

pub use activity::ActivityTracker;
pub use auth::{AuthSessionManager, AuthState, InitOutcome};
pub use client::ChatClient;
pub use config::ChatSettings;
pub use controller::ChatController;
pub use dispatcher::TurnOutcome;
pub use feedback::FeedbackOutcome;
pub use history::{HistoryOrder, HistoryQuery, HistoryRange, HistoryService, SessionSummary};
pub use state::{ChatEvent, ChatPhase, ChatSnapshot, MessageView};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, SessionStore};
