//! Real-time store client for sessions and messages.

pub mod config;
pub mod health;
pub mod memory;
pub mod poll;
pub mod rest;
pub mod store;
pub mod subscription;

pub use config::*;
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use store::RealtimeStore;
pub use subscription::MessageSubscription;

use chat_core::Result;
use std::sync::Arc;
use tracing::info;

/// Build the configured backend.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn RealtimeStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Rest => Ok(Arc::new(RestStore::new(config)?)),
    }
}
