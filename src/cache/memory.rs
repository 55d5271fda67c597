use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use moka::{future::Cache, Expiry};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on entry lifetime; longer TTLs are clamped to it
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: Arc<[u8]>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process cache backend on moka. Short-lived listings and long-lived
/// line counts share one store; every entry carries its own TTL.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .eviction_listener(|key, _value, cause| {
                tracing::trace!("Cache evicted {} ({:?})", key, cause);
            })
            .build();
        Self { entries }
    }

    /// Live entry count after pending expirations are applied
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.value.to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: Arc::from(value),
            ttl: ttl.min(MAX_TTL),
        };
        self.entries.insert(key.to_string(), entry).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_returns_same_bytes() {
        let cache = MemoryCache::new();
        let value = br#"[{"ID":1,"Name":"hello"}]"#;

        cache
            .set("github_get_all_repos_", value, Duration::from_secs(60))
            .await
            .unwrap();

        let hit = cache.get("github_get_all_repos_").await.unwrap();
        assert_eq!(hit.as_deref(), Some(&value[..]));
    }

    #[tokio::test]
    async fn test_missing_key_is_clean_miss() {
        let cache = MemoryCache::new();
        assert!(cache.get("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_own_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("short", b"v", Duration::from_millis(20))
            .await
            .unwrap();
        cache.set("long", b"v", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("short").await.unwrap().is_none());
        assert!(cache.get("long").await.unwrap().is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_unbounded_ttl_is_clamped() {
        let cache = MemoryCache::new();
        cache
            .set("forever", b"v", Duration::from_secs(u64::MAX))
            .await
            .unwrap();

        assert_eq!(cache.get("forever").await.unwrap().as_deref(), Some(&b"v"[..]));
    }

    #[tokio::test]
    async fn test_set_overwrites_and_resets_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", b"old", Duration::from_millis(20)).await.unwrap();
        cache.set("k", b"new", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some(&b"new"[..]));
    }
}
