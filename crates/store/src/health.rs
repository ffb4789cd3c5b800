//! Store health checks.

use crate::store::RealtimeStore;
use telemetry::health;
use tracing::{debug, error};

/// Check store connectivity and record it in the health registry.
pub async fn check_connection(store: &dyn RealtimeStore) -> bool {
    match store.ping().await {
        Ok(()) => {
            debug!("Store connection healthy");
            health().store.set_healthy();
            true
        }
        Err(e) => {
            error!("Store health check failed: {}", e);
            health().store.set_unhealthy(e.to_string());
            false
        }
    }
}
