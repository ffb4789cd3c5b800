//! PostgREST-compatible store backend.
//!
//! Rows use the hosted schema's column names (`user_id`, `chat_id`); they
//! are mapped to the core types at this boundary. Subscriptions poll.

use async_trait::async_trait;
use chat_core::{Error, Message, MessageId, Result, Role, Session, SessionId, SessionStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

use crate::config::StoreConfig;
use crate::poll::{run_poller, PollCursor};
use crate::store::RealtimeStore;
use crate::subscription::{MessageSubscription, SUBSCRIPTION_BUFFER};

#[derive(Debug, Serialize, Deserialize)]
struct SessionRow {
    id: String,
    user_id: String,
    status: SessionStatus,
    created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: SessionId::new(row.id),
            owner: row.user_id,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            user_id: session.owner.clone(),
            status: session.status,
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageRow {
    id: String,
    chat_id: String,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: MessageId::new(row.id),
            session_id: SessionId::new(row.chat_id),
            role: row.role,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

impl From<&Message> for MessageRow {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            chat_id: message.session_id.to_string(),
            role: message.role,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// REST store client.
#[derive(Clone)]
pub struct RestStore {
    http: Client,
    sessions_url: Url,
    messages_url: Url,
    poll_interval: Duration,
}

impl RestStore {
    /// Creates a new REST store client.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::validation("store url is required for the rest backend"));
        }

        let mut root = Url::parse(&config.url)
            .map_err(|e| Error::validation(format!("invalid store url: {}", e)))?;
        if !root.path().ends_with('/') {
            root.set_path(&format!("{}/", root.path()));
        }
        let join = |table: &str| {
            root.join(table)
                .map_err(|e| Error::validation(format!("invalid table name {}: {}", table, e)))
        };
        let sessions_url = join(&config.sessions_table)?;
        let messages_url = join(&config.messages_table)?;

        let mut headers = HeaderMap::new();
        if let Some(ref key) = config.api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|_| Error::validation("store api key is not a valid header value"))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| Error::validation("store api key is not a valid header value"))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::store(format!("failed to build HTTP client: {}", e)))?;

        info!(
            url = %config.url,
            sessions = %config.sessions_table,
            messages = %config.messages_table,
            "Created REST store client"
        );

        Ok(Self {
            http,
            sessions_url,
            messages_url,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(50)),
        })
    }

    async fn send(request: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::store(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::store(format!("{} returned {}: {}", what, status, body)));
        }
        Ok(response)
    }

    async fn fetch<T: serde::de::DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<Vec<T>> {
        Self::send(request, what)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(|e| Error::store(format!("{} returned invalid rows: {}", what, e)))
    }

    async fn messages_since(&self, id: &SessionId, since: DateTime<Utc>) -> Result<Vec<Message>> {
        let request = self.http.get(self.messages_url.clone()).query(&[
            ("select", "*".to_string()),
            ("chat_id", eq(id)),
            ("created_at", format!("gte.{}", timestamp(since))),
            ("order", "created_at.asc".to_string()),
        ]);
        let rows: Vec<MessageRow> = Self::fetch(request, "poll messages").await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }
}

#[async_trait]
impl RealtimeStore for RestStore {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let request = self
            .http
            .get(self.sessions_url.clone())
            .query(&[("select", "*".to_string()), ("id", eq(id)), ("limit", "1".to_string())]);
        let rows: Vec<SessionRow> = Self::fetch(request, "get session").await?;
        Ok(rows.into_iter().next().map(Session::from))
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        let request = self
            .http
            .post(self.sessions_url.clone())
            .header("Prefer", "return=minimal")
            .json(&[SessionRow::from(session)]);
        Self::send(request, "insert session").await?;
        debug!(session_id = %session.id, "Inserted session");
        Ok(())
    }

    async fn update_session_status(&self, id: &SessionId, status: SessionStatus) -> Result<()> {
        // Only active rows match; closed rows stay untouched.
        let request = self
            .http
            .patch(self.sessions_url.clone())
            .query(&[("id", eq(id)), ("status", eq(SessionStatus::Active.as_str()))])
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "status": status }));
        Self::send(request, "update session status").await?;
        Ok(())
    }

    async fn sessions_for_owner(
        &self,
        owner: &str,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("user_id", eq(owner)),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(status) = status {
            query.push(("status", eq(status.as_str())));
        }
        let request = self.http.get(self.sessions_url.clone()).query(&query);
        let rows: Vec<SessionRow> = Self::fetch(request, "list sessions").await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn messages_for_session(&self, id: &SessionId) -> Result<Vec<Message>> {
        let request = self.http.get(self.messages_url.clone()).query(&[
            ("select", "*".to_string()),
            ("chat_id", eq(id)),
            ("order", "created_at.asc".to_string()),
        ]);
        let rows: Vec<MessageRow> = Self::fetch(request, "list messages").await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn insert_message(&self, message: &Message) -> Result<()> {
        let request = self
            .http
            .post(self.messages_url.clone())
            .header("Prefer", "return=minimal")
            .json(&[MessageRow::from(message)]);
        Self::send(request, "insert message").await?;
        Ok(())
    }

    async fn subscribe_messages(&self, id: &SessionId) -> Result<MessageSubscription> {
        let existing = self.messages_for_session(id).await?;
        let cursor = PollCursor::after(&existing, Utc::now());
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        let store = self.clone();
        let session_id = id.clone();
        let interval = self.poll_interval;
        let task = tokio::spawn(async move {
            let fetch_id = session_id.clone();
            run_poller(session_id, cursor, interval, tx, |since| {
                let store = store.clone();
                let id = fetch_id.clone();
                async move { store.messages_since(&id, since).await }
            })
            .await;
        });

        Ok(MessageSubscription::new(id.clone(), rx, task))
    }

    async fn ping(&self) -> Result<()> {
        let request = self
            .http
            .get(self.sessions_url.clone())
            .query(&[("select", "id"), ("limit", "1")]);
        Self::send(request, "ping").await?;
        Ok(())
    }
}
