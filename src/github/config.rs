use crate::model::DEFAULT_PER_PAGE;
use std::env;

const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub integration configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Personal access token; the provider is disabled without one
    pub token: Option<String>,

    /// REST API base URL (override for GitHub Enterprise or tests)
    pub api_url: String,

    /// Rate limit buffer - reserve this many requests
    pub rate_limit_buffer: u32,

    /// Page size used when the caller does not ask for one
    pub per_page: u32,

    /// Concurrent per-commit detail requests while listing commits
    pub detail_concurrency: usize,

    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
}

impl GitHubConfig {
    /// Create a new GitHubConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            token: env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            api_url: env::var("GITHUB_API_URL").unwrap_or(defaults.api_url),
            rate_limit_buffer: env::var("GITHUB_RATE_LIMIT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_buffer),
            per_page: env::var("GITHUB_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.per_page),
            detail_concurrency: env::var("GITHUB_DETAIL_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.detail_concurrency),
            http_timeout_secs: env::var("GITHUB_HTTP_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
        }
    }

    /// Configuration pointing at an arbitrary API base URL
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// GitHub is only wired up when a token is configured
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Get the base API URL without a trailing slash
    pub fn api_base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            rate_limit_buffer: 100,
            per_page: DEFAULT_PER_PAGE,
            detail_concurrency: 8,
            http_timeout_secs: 30,
        }
    }
}
