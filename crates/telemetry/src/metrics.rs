//! In-process counters for the chat lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Saturates at zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s, 60s
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    // Agent turns run through an LLM; the range is seconds, not milliseconds.
    const BUCKET_BOUNDS: [u64; 10] = [50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000, 60_000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the chat client.
#[derive(Debug, Default)]
pub struct Metrics {
    // Session lifecycle
    pub sessions_started: Counter,
    pub session_start_failures: Counter,
    pub sessions_locked: Counter,
    pub sessions_expired: Counter,
    pub close_failures: Counter,

    // Turns
    pub turns_sent: Counter,
    pub turn_failures: Counter,
    pub turns_rejected_in_flight: Counter,

    // Real-time sync
    pub messages_pushed: Counter,
    pub echoes_merged: Counter,

    // Feedback and survey
    pub feedback_sent: Counter,
    pub feedback_masked: Counter,
    pub surveys_submitted: Counter,
    pub surveys_skipped: Counter,

    // Latency histograms
    pub turn_latency_ms: Histogram,

    // Gauges
    pub active_subscriptions: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sessions_started: u64,
    pub session_start_failures: u64,
    pub sessions_locked: u64,
    pub sessions_expired: u64,
    pub close_failures: u64,
    pub turns_sent: u64,
    pub turn_failures: u64,
    pub turns_rejected_in_flight: u64,
    pub messages_pushed: u64,
    pub echoes_merged: u64,
    pub feedback_sent: u64,
    pub feedback_masked: u64,
    pub surveys_submitted: u64,
    pub surveys_skipped: u64,
    pub turn_latency_mean_ms: f64,
    pub active_subscriptions: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            sessions_started: self.sessions_started.get(),
            session_start_failures: self.session_start_failures.get(),
            sessions_locked: self.sessions_locked.get(),
            sessions_expired: self.sessions_expired.get(),
            close_failures: self.close_failures.get(),
            turns_sent: self.turns_sent.get(),
            turn_failures: self.turn_failures.get(),
            turns_rejected_in_flight: self.turns_rejected_in_flight.get(),
            messages_pushed: self.messages_pushed.get(),
            echoes_merged: self.echoes_merged.get(),
            feedback_sent: self.feedback_sent.get(),
            feedback_masked: self.feedback_masked.get(),
            surveys_submitted: self.surveys_submitted.get(),
            surveys_skipped: self.surveys_skipped.get(),
            turn_latency_mean_ms: self.turn_latency_ms.mean(),
            active_subscriptions: self.active_subscriptions.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
