use crate::cache::cached::CachePolicy;
use crate::cache::memory::MAX_TTL;
use crate::error::{Error, Result};
use crate::github::GitHubConfig;
use crate::gitlab::GitLabConfig;
use crate::service::Provider;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub loc: LocConfig,
    pub github: GitHubConfig,
    pub gitlab: GitLabConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests per second per client IP
    pub api_rate_limit: u64,
    /// Deadline for each cache call and each upstream fetch
    pub request_timeout_secs: u64,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub loc_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LocConfig {
    pub timeout_secs: u64,
}

/// Read `name`, falling back to `default` when unset
fn env_or<T: FromStr>(name: &str, default: &str) -> Result<T> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| Error::Config(format!("Invalid {name} value")))
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Settings {
            server: ServerConfig {
                host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("PORT", "1323")?,
                api_rate_limit: env_or("API_RATE_LIMIT", "100")?,
                request_timeout_secs: env_or("REQUEST_TIMEOUT", "30")?,
                max_request_body_size: env_or("MAX_REQUEST_BODY_SIZE", "1048576")?,
            },
            cache: CacheConfig {
                ttl_secs: env_or("CACHE_TTL", "3600")?,
                loc_ttl_secs: env_or("CACHE_LOC_TTL", "86400")?,
            },
            loc: LocConfig {
                timeout_secs: env_or("LOC_TIMEOUT", "300")?,
            },
            github: GitHubConfig::from_env(),
            gitlab: GitLabConfig::from_env(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        if self.server.api_rate_limit == 0 {
            return Err(Error::Config("API rate limit must be non-zero".to_string()));
        }

        if self.server.request_timeout_secs == 0 || self.loc.timeout_secs == 0 {
            return Err(Error::Config("Timeouts must be non-zero".to_string()));
        }

        if self.cache.ttl_secs == 0 || self.cache.loc_ttl_secs == 0 {
            return Err(Error::Config("Cache TTLs must be non-zero".to_string()));
        }

        if self.cache.ttl_secs.max(self.cache.loc_ttl_secs) > MAX_TTL.as_secs() {
            return Err(Error::Config(format!(
                "Cache TTLs must not exceed {}s",
                MAX_TTL.as_secs()
            )));
        }

        if self.github.per_page == 0 || self.gitlab.per_page == 0 {
            return Err(Error::Config("Page size must be non-zero".to_string()));
        }

        if self.github.detail_concurrency == 0 || self.gitlab.detail_concurrency == 0 {
            return Err(Error::Config("Detail concurrency must be non-zero".to_string()));
        }

        url::Url::parse(&self.github.api_url)
            .map_err(|e| Error::Config(format!("Invalid GITHUB_API_URL: {e}")))?;
        url::Url::parse(&self.gitlab.host)
            .map_err(|e| Error::Config(format!("Invalid GITLAB_HOST: {e}")))?;

        Ok(())
    }

    /// Providers with a token configured
    pub fn enabled_providers(&self) -> Vec<Provider> {
        let mut providers = Vec::new();
        if self.github.is_enabled() {
            providers.push(Provider::GitHub);
        }
        if self.gitlab.is_enabled() {
            providers.push(Provider::GitLab);
        }
        providers
    }

    /// Cache TTLs and deadlines for `provider`
    pub fn cache_policy(&self, provider: Provider) -> CachePolicy {
        let default_per_page = match provider {
            Provider::GitHub => self.github.per_page,
            Provider::GitLab => self.gitlab.per_page,
        };
        CachePolicy {
            ttl: Duration::from_secs(self.cache.ttl_secs),
            loc_ttl: Duration::from_secs(self.cache.loc_ttl_secs),
            deadline: Duration::from_secs(self.server.request_timeout_secs),
            loc_timeout: Duration::from_secs(self.loc.timeout_secs),
            default_per_page,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 1323,
                api_rate_limit: 100,
                request_timeout_secs: 30,
                max_request_body_size: 1048576,
            },
            cache: CacheConfig {
                ttl_secs: 3600,
                loc_ttl_secs: 86400,
            },
            loc: LocConfig { timeout_secs: 300 },
            github: GitHubConfig::default(),
            gitlab: GitLabConfig::default(),
        }
    }
}
