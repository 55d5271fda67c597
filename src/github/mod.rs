pub mod adapter;
pub mod client;
pub mod config;
pub mod models;

pub use adapter::GitHubService;
pub use client::GitHubClient;
pub use config::GitHubConfig;
