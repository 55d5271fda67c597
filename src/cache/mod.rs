//! Look-aside caching for provider reads.
//!
//! [`CacheBackend`] is the key-value contract; [`CachedService`] wraps a
//! [`GitService`](crate::service::GitService) with it.

pub mod cached;
pub mod keys;
pub mod memory;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use cached::CachedService;
pub use memory::MemoryCache;

/// Cache operation errors. Never surfaced past the cache-aside layer.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out")]
    Timeout,
}

/// Key-value store with per-entry expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// `Ok(None)` is a clean miss
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
}
