//! Webhook gateway configuration.

use chat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Webhook gateway configuration.
///
/// Each path is joined onto `base_url` unless it is an absolute URL itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    #[serde(default = "default_feedback_path")]
    pub feedback_path: String,
    #[serde(default = "default_survey_path")]
    pub survey_path: String,
    /// Per-request timeout in milliseconds. Agent turns can be slow.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:5678/webhook".to_string()
}

fn default_login_path() -> String {
    "login".to_string()
}

fn default_chat_path() -> String {
    "chat".to_string()
}

fn default_feedback_path() -> String {
    "feedback".to_string()
}

fn default_survey_path() -> String {
    "survey".to_string()
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            chat_path: default_chat_path(),
            feedback_path: default_feedback_path(),
            survey_path: default_survey_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl WebhookConfig {
    /// Resolve an endpoint path to a full URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(path) {
            return Ok(url);
        }

        let mut base = Url::parse(&self.base_url)
            .map_err(|e| Error::validation(format!("invalid webhook base url: {}", e)))?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| Error::validation(format!("invalid webhook path {}: {}", path, e)))
    }
}
