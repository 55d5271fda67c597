pub mod adapter;
pub mod client;
pub mod config;
pub mod models;

pub use adapter::GitLabService;
pub use client::GitLabClient;
pub use config::GitLabConfig;
