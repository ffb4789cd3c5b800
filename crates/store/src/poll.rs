//! Polling subscription for backends without a push channel.
//!
//! Each poll fetches rows created at or after the cursor. Rows already seen
//! are skipped, so equal timestamps at the cursor boundary are delivered once.

use chat_core::{Message, MessageId, Result, SessionId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Read position of a polling subscription.
#[derive(Debug, Clone)]
pub struct PollCursor {
    since: DateTime<Utc>,
    seen: HashSet<MessageId>,
}

impl PollCursor {
    /// Start after the rows that already exist.
    pub fn after(existing: &[Message], now: DateTime<Utc>) -> Self {
        let since = existing
            .iter()
            .map(|m| m.created_at)
            .max()
            .map_or(now, |latest| latest.min(now));
        Self {
            since,
            seen: existing.iter().map(|m| m.id.clone()).collect(),
        }
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Keep the unseen rows of `batch` in creation order and advance.
    pub fn admit(&mut self, mut batch: Vec<Message>) -> Vec<Message> {
        batch.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let fresh: Vec<Message> = batch
            .into_iter()
            .filter(|m| self.seen.insert(m.id.clone()))
            .collect();

        if let Some(latest) = fresh.iter().map(|m| m.created_at).max() {
            self.since = self.since.max(latest);
        }
        fresh
    }
}

/// Poll `fetch` every `interval` and forward new rows until the receiver goes away.
pub async fn run_poller<F, Fut>(
    session_id: SessionId,
    mut cursor: PollCursor,
    interval: Duration,
    tx: mpsc::Sender<Message>,
    fetch: F,
) where
    F: Fn(DateTime<Utc>) -> Fut,
    Fut: Future<Output = Result<Vec<Message>>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if tx.is_closed() {
            break;
        }

        let batch = match fetch(cursor.since()).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Message poll failed");
                continue;
            }
        };

        let fresh = cursor.admit(batch);
        if fresh.is_empty() {
            continue;
        }

        debug!(session_id = %session_id, count = fresh.len(), "Polled new messages");
        for message in fresh {
            if tx.send(message).await.is_err() {
                return;
            }
        }
    }
}
