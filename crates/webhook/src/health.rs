//! Gateway health checks.

use crate::gateway::AgentGateway;
use telemetry::health;
use tracing::{debug, warn};

/// Probe the gateway host and record it in the health registry.
pub async fn check_connection(gateway: &dyn AgentGateway) -> bool {
    let healthy = gateway.is_healthy().await;
    if healthy {
        debug!("Gateway reachable");
    } else {
        warn!("Gateway health check failed");
    }
    health().gateway.record(healthy, "webhook host unreachable");
    healthy
}
