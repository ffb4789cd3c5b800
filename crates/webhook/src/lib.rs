//! Agent webhook gateway.

pub mod config;
pub mod gateway;
pub mod health;
pub mod http;

pub use config::WebhookConfig;
pub use gateway::AgentGateway;
pub use http::HttpGateway;
