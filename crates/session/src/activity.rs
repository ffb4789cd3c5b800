//! Last-activity tracking and inactivity expiry.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

use crate::storage::SessionStore;

/// Records user activity and decides whether the inactivity window elapsed.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    store: SessionStore,
    timeout: Duration,
}

impl ActivityTracker {
    pub fn new(store: SessionStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record now as the last activity.
    ///
    /// Only recorded while a credential is stored, and never moves backwards.
    /// Returns whether the timestamp was written.
    pub fn touch(&self) -> bool {
        self.touch_at(Utc::now())
    }

    pub fn touch_at(&self, now: DateTime<Utc>) -> bool {
        if self.store.auth_token().is_none() {
            return false;
        }
        if self
            .store
            .last_activity()
            .is_some_and(|last| last.timestamp_millis() >= now.timestamp_millis())
        {
            return false;
        }
        match self.store.set_last_activity(now) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to record activity");
                false
            }
        }
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.store.last_activity()
    }

    /// True when more than the timeout has passed since the last activity.
    /// No recorded activity never counts as expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.store.last_activity() else {
            return false;
        };
        // Stored at millisecond precision
        let idle_ms = now.timestamp_millis() - last.timestamp_millis();
        match u128::try_from(idle_ms) {
            Ok(idle) => idle > self.timeout.as_millis(),
            // Last activity in the future
            Err(_) => false,
        }
    }
}
