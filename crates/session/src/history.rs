//! Read-only history of closed sessions.

use chat_core::{Message, Result, Session, SessionId, SessionStatus};
use chrono::{DateTime, Months, Utc};
use moka::future::Cache;
use realtime_store::RealtimeStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Maximum cached transcripts.
const TRANSCRIPT_CACHE_MAX_CAPACITY: u64 = 1_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRange {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl HistoryRange {
    fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Today => at.date_naive() == now.date_naive(),
            Self::Week => at >= now - chrono::Duration::days(7),
            Self::Month => now
                .checked_sub_months(Months::new(1))
                .map_or(true, |start| at >= start),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryOrder {
    #[default]
    Newest,
    Oldest,
}

/// Filters for the history list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Case-insensitive substring of the session id
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub range: HistoryRange,
    #[serde(default)]
    pub order: HistoryOrder,
}

/// One row of the history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    /// Short display label
    pub label: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionSummary {
    fn from(session: Session) -> Self {
        Self {
            label: session.short_id(),
            id: session.id,
            status: session.status,
            created_at: session.created_at,
        }
    }
}

pub struct HistoryService {
    store: Arc<dyn RealtimeStore>,
    /// Closed transcripts never change
    transcripts: Cache<SessionId, Arc<Vec<Message>>>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn RealtimeStore>, ttl: Duration) -> Self {
        Self {
            store,
            transcripts: Cache::builder()
                .max_capacity(TRANSCRIPT_CACHE_MAX_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn closed_sessions(&self, owner: &str, query: &HistoryQuery) -> Result<Vec<SessionSummary>> {
        self.closed_sessions_at(owner, query, Utc::now()).await
    }

    pub async fn closed_sessions_at(
        &self,
        owner: &str,
        query: &HistoryQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionSummary>> {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut sessions: Vec<Session> = self
            .store
            .sessions_for_owner(owner, Some(SessionStatus::Closed))
            .await?
            .into_iter()
            .filter(|s| query.range.contains(s.created_at, now))
            .filter(|s| {
                needle
                    .as_ref()
                    .map_or(true, |n| s.id.as_str().to_lowercase().contains(n))
            })
            .collect();

        match query.order {
            HistoryOrder::Newest => sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            HistoryOrder::Oldest => sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }

        Ok(sessions.into_iter().map(SessionSummary::from).collect())
    }

    /// Transcript of one of `owner`'s sessions, or `None` when it is not theirs.
    pub async fn transcript(&self, owner: &str, id: &SessionId) -> Result<Option<Vec<Message>>> {
        let Some(session) = self.store.get_session(id).await? else {
            return Ok(None);
        };
        if session.owner != owner {
            debug!(session_id = %id, "Transcript requested for foreign session");
            return Ok(None);
        }

        if let Some(cached) = self.transcripts.get(id).await {
            debug!(session_id = %id, "Transcript cache hit");
            return Ok(Some(cached.as_ref().clone()));
        }

        let messages = self.store.messages_for_session(id).await?;
        if !session.is_active() {
            self.transcripts
                .insert(id.clone(), Arc::new(messages.clone()))
                .await;
        }
        Ok(Some(messages))
    }
}

impl std::fmt::Debug for HistoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryService")
            .field("cached", &self.transcripts.entry_count())
            .finish()
    }
}
