//! Telemetry for the support-chat client.
//!
//! Counters and health live in process; the bridge exposes them on `/health`.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
