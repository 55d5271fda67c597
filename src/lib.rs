pub mod config;
pub mod error;

// Canonical model and the provider contract
pub mod model;
pub mod service;

// Provider adapters
pub mod github;
pub mod gitlab;
pub mod rate_limiter;

// Read path
pub mod cache;
pub mod loc;
pub mod registry;
pub mod stats;

// Observability
pub mod metrics;

// Dispatch
pub mod api;
pub mod cli;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};
pub use service::{GitService, Identifier, Provider};
