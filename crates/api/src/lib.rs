//! Local HTTP bridge for the support-chat client.
//!
//! One bridge process serves one browser tab: the view calls these routes
//! and renders the snapshots they return.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
