use crate::model::DEFAULT_PER_PAGE;
use std::env;

const DEFAULT_HOST: &str = "https://gitlab.com";

/// GitLab integration configuration
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Personal access token; the provider is disabled without one
    pub token: Option<String>,

    /// Instance URL, e.g. https://gitlab.example.com
    pub host: String,

    /// Rate limit buffer - reserve this many requests
    pub rate_limit_buffer: u32,

    /// Page size used when the caller does not ask for one
    pub per_page: u32,

    /// Concurrent per-commit detail requests for commits listed without stats
    pub detail_concurrency: usize,

    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
}

impl GitLabConfig {
    /// Create a new GitLabConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            token: env::var("GITLAB_TOKEN").ok().filter(|t| !t.is_empty()),
            host: env::var("GITLAB_HOST")
                .ok()
                .filter(|h| !h.is_empty())
                .unwrap_or(defaults.host),
            rate_limit_buffer: env::var("GITLAB_RATE_LIMIT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_buffer),
            per_page: env::var("GITLAB_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.per_page),
            detail_concurrency: env::var("GITLAB_DETAIL_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.detail_concurrency),
            http_timeout_secs: env::var("GITLAB_HTTP_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
        }
    }

    /// Configuration pointing at an arbitrary instance
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// REST API v4 base URL
    pub fn api_base_url(&self) -> String {
        format!("{}/api/v4", self.host.trim_end_matches('/'))
    }
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            token: None,
            host: DEFAULT_HOST.to_string(),
            rate_limit_buffer: 100,
            per_page: DEFAULT_PER_PAGE,
            detail_concurrency: 8,
            http_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_url_strips_trailing_slash() {
        let config = GitLabConfig::with_host("https://gitlab.example.com/");
        assert_eq!(config.api_base_url(), "https://gitlab.example.com/api/v4");
    }
}
