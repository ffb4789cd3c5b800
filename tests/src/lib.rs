//! Shared harness for the support-chat integration tests.

pub mod fixtures;
pub mod mocks;
pub mod setup;
