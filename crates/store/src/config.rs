//! Real-time store configuration.

use serde::{Deserialize, Serialize};

/// Which store implementation backs the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, lost on exit
    #[default]
    Memory,
    /// Hosted PostgREST-compatible database
    Rest,
}

/// Real-time store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// REST root, e.g. `https://project.example.co/rest/v1`
    #[serde(default)]
    pub url: String,
    /// Project API key, sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_sessions_table")]
    pub sessions_table: String,
    #[serde(default = "default_messages_table")]
    pub messages_table: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Interval between subscription polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_sessions_table() -> String {
    "chats".to_string()
}

fn default_messages_table() -> String {
    "messages".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::new(),
            api_key: None,
            sessions_table: default_sessions_table(),
            messages_table: default_messages_table(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}
