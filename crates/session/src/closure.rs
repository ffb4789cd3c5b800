//! Best-effort remote closure.

use chat_core::{SessionId, SessionStatus};
use realtime_store::RealtimeStore;
use telemetry::metrics;
use tracing::{info, warn};

/// Mark a session closed remotely. Failures are logged and counted, never returned.
pub async fn close_remote(store: &dyn RealtimeStore, id: &SessionId, reason: &str) -> bool {
    match store.update_session_status(id, SessionStatus::Closed).await {
        Ok(()) => {
            info!(session_id = %id, reason, "Session closed");
            true
        }
        Err(e) => {
            metrics().close_failures.inc();
            warn!(session_id = %id, reason, error = %e, "Best-effort session close failed");
            false
        }
    }
}
