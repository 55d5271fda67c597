use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Names of the rate limit headers a provider sends
#[derive(Debug, Clone, Copy)]
pub struct RateLimitHeaders {
    pub limit: &'static str,
    pub remaining: &'static str,
    /// Unix timestamp (seconds) at which the budget resets
    pub reset: &'static str,
}

impl RateLimitHeaders {
    pub const GITHUB: Self = Self {
        limit: "x-ratelimit-limit",
        remaining: "x-ratelimit-remaining",
        reset: "x-ratelimit-reset",
    };

    pub const GITLAB: Self = Self {
        limit: "ratelimit-limit",
        remaining: "ratelimit-remaining",
        reset: "ratelimit-reset",
    };
}

/// Rate limiter driven by provider response headers
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<RwLock<RateLimitState>>,
    headers: RateLimitHeaders,
    buffer: u32,
}

#[derive(Debug, Clone)]
struct RateLimitState {
    /// Total rate limit
    limit: u32,

    /// Remaining requests
    remaining: u32,

    /// Unix timestamp when rate limit resets
    reset_at: i64,
}

impl RateLimiter {
    /// Create a new rate limiter with a buffer
    pub fn new(headers: RateLimitHeaders, buffer: u32) -> Self {
        Self {
            state: Arc::new(RwLock::new(RateLimitState {
                limit: 60, // Unknown until the first response arrives
                remaining: 60,
                reset_at: Utc::now().timestamp() + 3600,
            })),
            headers,
            buffer,
        }
    }

    /// Update rate limit from response headers
    pub async fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        };

        let limit = read(self.headers.limit).and_then(|s| s.parse::<u32>().ok());
        let remaining = read(self.headers.remaining).and_then(|s| s.parse::<u32>().ok());
        let reset = read(self.headers.reset).and_then(|s| s.parse::<i64>().ok());

        if limit.is_none() && remaining.is_none() && reset.is_none() {
            return;
        }

        let mut state = self.state.write().await;
        if let Some(limit) = limit {
            state.limit = limit;
        }
        if let Some(remaining) = remaining {
            state.remaining = remaining;
        }
        if let Some(reset) = reset {
            state.reset_at = reset;
        }

        debug!(
            "Rate limit updated: {}/{} (resets at {})",
            state.remaining, state.limit, state.reset_at
        );
    }

    /// Check if we should wait before making the next request
    pub async fn should_wait(&self) -> bool {
        let state = self.state.read().await;
        // Use the minimum of buffer or 10% of limit to handle low rate limits
        let threshold = std::cmp::min(self.buffer, (state.limit / 10).max(5));
        state.remaining <= threshold
    }

    /// Wait if necessary before making a request
    pub async fn wait_if_needed(&self) {
        if !self.should_wait().await {
            return;
        }

        let wait_secs = {
            let state = self.state.read().await;
            let now = Utc::now().timestamp();
            if now >= state.reset_at {
                return;
            }
            warn!(
                "Rate limit approaching ({}/{}), waiting {} seconds until reset",
                state.remaining,
                state.limit,
                state.reset_at - now
            );
            (state.reset_at - now) as u64
        };

        tokio::time::sleep(tokio::time::Duration::from_secs(wait_secs)).await;
    }

    /// Get current rate limit status
    pub async fn get_status(&self) -> (u32, u32, DateTime<Utc>) {
        let state = self.state.read().await;
        (
            state.remaining,
            state.limit,
            DateTime::from_timestamp(state.reset_at, 0).unwrap_or_else(Utc::now),
        )
    }
}
