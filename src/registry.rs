use crate::cache::{CacheBackend, CachedService};
use crate::config::Settings;
use crate::github::GitHubService;
use crate::gitlab::GitLabService;
use crate::metrics::Metrics;
use crate::service::{GitService, Provider};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Cached services for every enabled provider
#[derive(Clone, Default)]
pub struct Services {
    by_provider: BTreeMap<Provider, CachedService>,
}

impl Services {
    /// Wire an adapter for each provider with a configured token, all
    /// sharing one cache backend and one metrics recorder
    pub fn from_settings(
        settings: &Settings,
        cache: Arc<dyn CacheBackend>,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let mut services = Self::default();

        for provider in settings.enabled_providers() {
            let adapter: Arc<dyn GitService> = match provider {
                Provider::GitHub => Arc::new(GitHubService::new(
                    settings.github.clone(),
                    metrics.clone(),
                )?),
                Provider::GitLab => Arc::new(GitLabService::new(
                    settings.gitlab.clone(),
                    metrics.clone(),
                )?),
            };
            info!("{} provider enabled", provider);
            services.insert(CachedService::new(
                adapter,
                cache.clone(),
                metrics.clone(),
                settings.cache_policy(provider),
            ));
        }

        Ok(services)
    }

    pub fn insert(&mut self, service: CachedService) {
        self.by_provider.insert(service.provider(), service);
    }

    /// Look up a provider by its route name. Unknown and disabled
    /// providers are both reported as not found.
    pub fn get(&self, name: &str) -> Result<&CachedService> {
        Provider::ALL
            .iter()
            .find(|p| p.as_str() == name)
            .and_then(|p| self.by_provider.get(p))
            .ok_or_else(|| Error::NotFound(format!("Provider '{name}' is not configured")))
    }

    pub fn provider(&self, provider: Provider) -> Result<&CachedService> {
        self.get(provider.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CachedService> {
        self.by_provider.values()
    }

    pub fn is_empty(&self) -> bool {
        self.by_provider.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    fn services(settings: &Settings) -> Services {
        Services::from_settings(
            settings,
            Arc::new(MemoryCache::new()),
            Arc::new(Metrics::new().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_no_tokens_no_providers() {
        let services = services(&Settings::default());
        assert!(services.is_empty());
        assert!(matches!(services.get("github"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_only_configured_providers_resolve() {
        let mut settings = Settings::default();
        settings.github.token = Some("ghp_test".to_string());
        let services = services(&settings);

        assert_eq!(services.get("github").unwrap().provider(), Provider::GitHub);
        assert!(matches!(services.get("gitlab"), Err(Error::NotFound(_))));
        assert!(matches!(services.get("bitbucket"), Err(Error::NotFound(_))));
        assert_eq!(services.iter().count(), 1);
    }
}
