use super::{keys, CacheBackend, CacheError};
use crate::loc::LineCounter;
use crate::metrics::Metrics;
use crate::model::{Commit, CommitListOptions, Repository, DEFAULT_PER_PAGE};
use crate::service::{GitService, Identifier, Provider};
use crate::stats::{self, AuthorStats};
use crate::{Error, Result};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// TTLs and deadlines applied by [`CachedService`]
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// TTL for listings and lookups
    pub ttl: Duration,
    /// TTL for line counts, which need a full clone
    pub loc_ttl: Duration,
    /// Upper bound for each cache call and each upstream fetch
    pub deadline: Duration,
    /// Upper bound for a line count
    pub loc_timeout: Duration,
    /// Adapter page size, used to normalize commit listing keys
    pub default_per_page: u32,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            loc_ttl: Duration::from_secs(86400),
            deadline: Duration::from_secs(30),
            loc_timeout: Duration::from_secs(300),
            default_per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Cache-aside wrapper around one provider's [`GitService`].
///
/// Reads return the serialized JSON payload. On a hit that is exactly the
/// stored bytes; on a miss the service is called, the result serialized,
/// written back, and returned. Cache failures are logged and absorbed.
/// Concurrent misses on one key each fetch and each write.
#[derive(Clone)]
pub struct CachedService {
    service: Arc<dyn GitService>,
    cache: Arc<dyn CacheBackend>,
    metrics: Arc<Metrics>,
    line_counter: LineCounter,
    policy: CachePolicy,
}

impl CachedService {
    pub fn new(
        service: Arc<dyn GitService>,
        cache: Arc<dyn CacheBackend>,
        metrics: Arc<Metrics>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            service,
            cache,
            metrics,
            line_counter: LineCounter::new(policy.loc_timeout),
            policy,
        }
    }

    pub fn provider(&self) -> Provider {
        self.service.provider()
    }

    /// Surrounding whitespace in `owner` is dropped for both the key and the request
    pub async fn all_repos(&self, owner: &str) -> Result<Vec<u8>> {
        let owner = owner.trim();
        let key = keys::all_repos(self.provider(), owner);
        self.cached(
            &key,
            self.policy.ttl,
            self.policy.deadline,
            self.service.get_all_repos(owner),
        )
        .await
    }

    pub async fn repo(&self, identifier: &Identifier) -> Result<Vec<u8>> {
        let key = keys::repo(self.provider(), identifier);
        self.cached(
            &key,
            self.policy.ttl,
            self.policy.deadline,
            self.service.get_repo(identifier),
        )
        .await
    }

    pub async fn project_commits(
        &self,
        identifier: &Identifier,
        options: &CommitListOptions,
    ) -> Result<Vec<u8>> {
        let key = keys::commits(
            self.provider(),
            identifier,
            options,
            self.policy.default_per_page,
        );
        self.cached(
            &key,
            self.policy.ttl,
            self.policy.deadline,
            self.service.get_project_commits(identifier, options),
        )
        .await
    }

    pub async fn repo_contributors(&self, identifier: &Identifier) -> Result<Vec<u8>> {
        let key = keys::contributors(self.provider(), identifier);
        self.cached(
            &key,
            self.policy.ttl,
            self.policy.deadline,
            self.service.get_repo_contributors(identifier),
        )
        .await
    }

    /// `{"totalLines": n}` for the repository at `clone_url`
    pub async fn lines_of_code(&self, clone_url: &str) -> Result<Vec<u8>> {
        let key = keys::lines_of_code(self.provider(), clone_url);
        // The counter enforces loc_timeout itself; the extra second lets its
        // own error surface instead of the generic deadline one
        self.cached(
            &key,
            self.policy.loc_ttl,
            self.policy.loc_timeout.saturating_add(Duration::from_secs(1)),
            self.line_counter.count(clone_url),
        )
        .await
    }

    /// Decoded form of [`CachedService::all_repos`]
    pub async fn repositories(&self, owner: &str) -> Result<Vec<Repository>> {
        let bytes = self.all_repos(owner).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Decoded form of [`CachedService::project_commits`]
    pub async fn commits(
        &self,
        identifier: &Identifier,
        options: &CommitListOptions,
    ) -> Result<Vec<Commit>> {
        let bytes = self.project_commits(identifier, options).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Per-author totals over one page of commits
    pub async fn author_stats(
        &self,
        identifier: &Identifier,
        options: &CommitListOptions,
    ) -> Result<AuthorStats> {
        let commits = self.commits(identifier, options).await?;
        Ok(stats::aggregate(&commits))
    }

    async fn cached<T, F>(
        &self,
        key: &str,
        ttl: Duration,
        deadline: Duration,
        fetch: F,
    ) -> Result<Vec<u8>>
    where
        T: Serialize,
        F: Future<Output = Result<T>>,
    {
        let read = tokio::time::timeout(self.policy.deadline, self.cache.get(key))
            .await
            .unwrap_or(Err(CacheError::Timeout));

        match read {
            Ok(Some(bytes)) => {
                debug!("Cache hit: {}", key);
                self.metrics.record_cache_hit();
                return Ok(bytes);
            }
            Ok(None) => debug!("Cache miss: {}", key),
            Err(e) => {
                warn!("Cache read failed for {}: {}. Fetching upstream", key, e);
                self.metrics.record_cache_read_error();
            }
        }
        self.metrics.record_cache_miss();

        let value = tokio::time::timeout(deadline, fetch)
            .await
            .map_err(|_| Error::Upstream(format!("{key}: no response within {deadline:?}")))??;

        let bytes = serde_json::to_vec(&value)?;

        let write = tokio::time::timeout(self.policy.deadline, self.cache.set(key, &bytes, ttl))
            .await
            .unwrap_or(Err(CacheError::Timeout));

        match write {
            Ok(()) => debug!("Cached {} ({} bytes, ttl {}s)", key, bytes.len(), ttl.as_secs()),
            Err(e) => {
                warn!("Cache write failed for {}: {}", key, e);
                self.metrics.record_cache_write_error();
            }
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::model::{CommitAuthor, CommitStats, User};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Service returning fixed data and counting upstream calls
    #[derive(Default)]
    struct CountingService {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingService {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Upstream("HTTP 500".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl GitService for CountingService {
        fn provider(&self) -> Provider {
            Provider::GitHub
        }

        async fn get_all_repos(&self, owner: &str) -> Result<Vec<Repository>> {
            self.record()?;
            Ok(vec![Repository {
                id: 1,
                name: "hello".to_string(),
                owner: owner.to_string(),
                ..Default::default()
            }])
        }

        async fn get_repo(&self, identifier: &Identifier) -> Result<Repository> {
            self.record()?;
            Ok(Repository {
                id: 7,
                name: identifier.to_string(),
                ..Default::default()
            })
        }

        async fn get_project_commits(
            &self,
            _identifier: &Identifier,
            _options: &CommitListOptions,
        ) -> Result<Vec<Commit>> {
            self.record()?;
            let commit = |sha: &str, login: &str, stats: CommitStats| Commit {
                sha: sha.to_string(),
                author: CommitAuthor {
                    name: login.to_uppercase(),
                    login: login.to_string(),
                    ..Default::default()
                },
                stats,
                ..Default::default()
            };
            Ok(vec![
                commit("a", "alice", CommitStats::new(10, 2, 12)),
                commit("b", "bob", CommitStats::new(5, 1, 6)),
            ])
        }

        async fn get_repo_contributors(&self, _identifier: &Identifier) -> Result<Vec<User>> {
            self.record()?;
            Ok(vec![])
        }
    }

    /// Backend whose reads and writes can be made to fail
    #[derive(Default)]
    struct FlakyCache {
        inner: MemoryCache,
        fail_get: bool,
        fail_set: bool,
        writes: Mutex<Vec<(String, Duration)>>,
    }

    #[async_trait]
    impl CacheBackend for FlakyCache {
        async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, CacheError> {
            if self.fail_get {
                return Err(CacheError::Unavailable("connection refused".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(
            &self,
            key: &str,
            value: &[u8],
            ttl: Duration,
        ) -> std::result::Result<(), CacheError> {
            self.writes.lock().unwrap().push((key.to_string(), ttl));
            if self.fail_set {
                return Err(CacheError::Unavailable("connection refused".to_string()));
            }
            self.inner.set(key, value, ttl).await
        }
    }

    fn cached_service(
        service: Arc<CountingService>,
        cache: Arc<FlakyCache>,
    ) -> (CachedService, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        let cached = CachedService::new(service, cache, metrics.clone(), CachePolicy::default());
        (cached, metrics)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let service = Arc::new(CountingService::default());
        let cache = Arc::new(FlakyCache::default());
        let (cached, metrics) = cached_service(service.clone(), cache.clone());

        let first = cached.all_repos("octo").await.unwrap();
        assert_eq!(service.calls(), 1);
        assert_eq!(cache.writes.lock().unwrap().len(), 1);
        assert_eq!(cache.writes.lock().unwrap()[0].0, "github_get_all_repos_octo");

        let second = cached.all_repos("octo").await.unwrap();
        assert_eq!(service.calls(), 1);
        assert_eq!(cache.writes.lock().unwrap().len(), 1);
        assert_eq!(first, second);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_owner_trimmed_for_key_and_request() {
        let service = Arc::new(CountingService::default());
        let cache = Arc::new(FlakyCache::default());
        let (cached, _) = cached_service(service.clone(), cache.clone());

        let bytes = cached.all_repos("  octo \n").await.unwrap();
        let repos: Vec<Repository> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(repos[0].owner, "octo");
        assert_eq!(cache.writes.lock().unwrap()[0].0, "github_get_all_repos_octo");

        cached.all_repos("octo").await.unwrap();
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_oversized_ttl_still_caches_and_returns_data() {
        let service = Arc::new(CountingService::default());
        let cache = Arc::new(MemoryCache::new());
        let policy = CachePolicy {
            ttl: Duration::from_secs(u64::MAX),
            loc_timeout: Duration::MAX,
            ..CachePolicy::default()
        };
        let cached = CachedService::new(
            service.clone(),
            cache,
            Arc::new(Metrics::new().unwrap()),
            policy,
        );

        let first = cached.all_repos("").await.unwrap();
        let second = cached.all_repos("").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_hit_returns_stored_bytes_verbatim() {
        let service = Arc::new(CountingService::default());
        let cache = Arc::new(FlakyCache::default());
        let stored = br#"{"ID":99,"Name":"from-cache"}"#;
        cache
            .inner
            .set("github_get_repo_99", stored, Duration::from_secs(60))
            .await
            .unwrap();
        let (cached, _) = cached_service(service.clone(), cache);

        let bytes = cached.repo(&Identifier::Id(99)).await.unwrap();
        assert_eq!(bytes, stored.to_vec());
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_read_error_falls_back_to_upstream() {
        let service = Arc::new(CountingService::default());
        let cache = Arc::new(FlakyCache {
            fail_get: true,
            ..Default::default()
        });
        let (cached, metrics) = cached_service(service.clone(), cache);

        let bytes = cached.repo(&Identifier::Id(7)).await.unwrap();
        let repo: Repository = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(repo.id, 7);
        assert_eq!(service.calls(), 1);
        assert_eq!(metrics.snapshot().cache_read_errors, 1);
    }

    #[tokio::test]
    async fn test_write_error_still_returns_data() {
        let service = Arc::new(CountingService::default());
        let cache = Arc::new(FlakyCache {
            fail_set: true,
            ..Default::default()
        });
        let (cached, metrics) = cached_service(service.clone(), cache);

        let bytes = cached.all_repos("").await.unwrap();
        let repos: Vec<Repository> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(metrics.snapshot().cache_write_errors, 1);

        // Nothing was stored, so the next call goes upstream again
        cached.all_repos("").await.unwrap();
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_errors_are_not_cached() {
        let service = Arc::new(CountingService {
            fail: true,
            ..Default::default()
        });
        let cache = Arc::new(FlakyCache::default());
        let (cached, _) = cached_service(service.clone(), cache.clone());

        let result = cached.repo(&Identifier::Id(1)).await;
        assert!(matches!(result, Err(Error::Upstream(_))));
        assert!(cache.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listings_use_short_ttl() {
        let service = Arc::new(CountingService::default());
        let cache = Arc::new(FlakyCache::default());
        let (cached, _) = cached_service(service, cache.clone());

        cached
            .project_commits(&Identifier::Id(3), &CommitListOptions::default())
            .await
            .unwrap();

        let writes = cache.writes.lock().unwrap();
        assert_eq!(
            writes[0],
            (
                "github_get_commits_3_sha=&path=&author=&page=1&per_page=100".to_string(),
                Duration::from_secs(3600)
            )
        );
    }

    #[tokio::test]
    async fn test_author_stats_from_cached_commits() {
        let service = Arc::new(CountingService::default());
        let cache = Arc::new(FlakyCache::default());
        let (cached, _) = cached_service(service.clone(), cache);
        let id = Identifier::parse("octo/hello").unwrap();

        let first = cached
            .author_stats(&id, &CommitListOptions::default())
            .await
            .unwrap();
        let second = cached
            .author_stats(&id, &CommitListOptions::default())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first["alice"], CommitStats::new(10, 2, 12));
        assert_eq!(first["bob"], CommitStats::new(5, 1, 6));
        assert_eq!(service.calls(), 1);
    }
}
