//! Chat lifecycle settings.

use chat_core::limits::{
    ESCALATION_TURN_THRESHOLD, INACTIVITY_TIMEOUT_SECS, PUSH_CLOSE_DELAY_MS,
    REPLY_CLOSE_DELAY_MS, SURVEY_DELAY_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat lifecycle settings. Defaults match the product behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,
    #[serde(default = "default_reply_close_delay_ms")]
    pub reply_close_delay_ms: u64,
    #[serde(default = "default_push_close_delay_ms")]
    pub push_close_delay_ms: u64,
    #[serde(default = "default_survey_delay_ms")]
    pub survey_delay_ms: u64,
    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: u32,
    /// Report feedback failures to the caller as masked successes
    #[serde(default = "default_true")]
    pub mask_feedback_errors: bool,
    #[serde(default = "default_history_cache_ttl_secs")]
    pub history_cache_ttl_secs: u64,
}

fn default_inactivity_timeout_secs() -> u64 {
    INACTIVITY_TIMEOUT_SECS
}

fn default_reply_close_delay_ms() -> u64 {
    REPLY_CLOSE_DELAY_MS
}

fn default_push_close_delay_ms() -> u64 {
    PUSH_CLOSE_DELAY_MS
}

fn default_survey_delay_ms() -> u64 {
    SURVEY_DELAY_MS
}

fn default_escalation_threshold() -> u32 {
    ESCALATION_TURN_THRESHOLD
}

fn default_true() -> bool {
    true
}

fn default_history_cache_ttl_secs() -> u64 {
    300
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            reply_close_delay_ms: default_reply_close_delay_ms(),
            push_close_delay_ms: default_push_close_delay_ms(),
            survey_delay_ms: default_survey_delay_ms(),
            escalation_threshold: default_escalation_threshold(),
            mask_feedback_errors: default_true(),
            history_cache_ttl_secs: default_history_cache_ttl_secs(),
        }
    }
}

impl ChatSettings {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    pub fn reply_close_delay(&self) -> Duration {
        Duration::from_millis(self.reply_close_delay_ms)
    }

    pub fn push_close_delay(&self) -> Duration {
        Duration::from_millis(self.push_close_delay_ms)
    }

    pub fn survey_delay(&self) -> Duration {
        Duration::from_millis(self.survey_delay_ms)
    }

    pub fn history_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.history_cache_ttl_secs)
    }
}
