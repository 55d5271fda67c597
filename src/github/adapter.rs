use crate::github::{
    client::{CommitQuery, GitHubClient},
    config::GitHubConfig,
    models,
};
use crate::metrics::{CallStatus, Metrics};
use crate::model::{Commit, CommitListOptions, CommitStats, Repository, User};
use crate::service::{GitService, Identifier, Provider};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// [`GitService`] backed by the GitHub REST API
#[derive(Clone)]
pub struct GitHubService {
    client: GitHubClient,
    metrics: Arc<Metrics>,
}

impl GitHubService {
    pub fn new(config: GitHubConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let client = GitHubClient::new(config, metrics.clone())?;
        Ok(Self { client, metrics })
    }

    fn per_page(&self) -> u32 {
        self.client.config().per_page
    }

    /// Attach line statistics to every listed commit, keeping listing order
    async fn with_stats(&self, owner: &str, name: &str, commits: Vec<models::Commit>) -> Vec<Commit> {
        let concurrency = self.client.config().detail_concurrency.max(1);

        stream::iter(commits)
            .map(|commit| async move {
                let stats = match commit.stats {
                    Some(stats) => stats.into(),
                    None => self.fetch_stats(owner, name, &commit.sha).await,
                };
                commit.into_canonical(stats)
            })
            .buffered(concurrency)
            .collect()
            .await
    }

    /// Stats from the single-commit endpoint, zero when that request fails
    async fn fetch_stats(&self, owner: &str, name: &str, sha: &str) -> CommitStats {
        match self.client.get_commit(owner, name, sha).await {
            Ok(models::Commit {
                stats: Some(stats), ..
            }) => stats.into(),
            Ok(_) => {
                warn!("Commit {} in {}/{} has no stats, using zero", sha, owner, name);
                self.metrics.record_stat_fallback();
                CommitStats::default()
            }
            Err(e) => {
                warn!(
                    "Could not fetch stats for commit {} in {}/{}: {}. Using zero",
                    sha,
                    owner,
                    name,
                    e.log_safe()
                );
                self.metrics.record_stat_fallback();
                CommitStats::default()
            }
        }
    }
}

#[async_trait]
impl GitService for GitHubService {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    async fn get_all_repos(&self, owner: &str) -> Result<Vec<Repository>> {
        let repos = if owner.is_empty() {
            self.client
                .list_authenticated_repositories(self.per_page())
                .await
        } else {
            match self.client.list_org_repositories(owner, self.per_page()).await {
                Err(Error::NotFound(_)) => {
                    debug!("{} is not an organization, listing user repositories", owner);
                    self.client.list_user_repositories(owner, self.per_page()).await
                }
                other => other,
            }
        }
        .map_err(|e| e.context(format!("list GitHub repositories (owner: '{owner}')")))?;

        info!("Fetched {} GitHub repositories (owner: '{}')", repos.len(), owner);
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    async fn get_repo(&self, identifier: &Identifier) -> Result<Repository> {
        let result = match identifier {
            Identifier::Id(id) => self.client.get_repository_by_id(*id).await,
            Identifier::Path { owner, name } => self.client.get_repository(owner, name).await,
        };

        self.metrics
            .record_repository_fetch(Provider::GitHub, CallStatus::from_ok(result.is_ok()));

        result
            .map(Repository::from)
            .map_err(|e| e.context(format!("get GitHub repository '{identifier}'")))
    }

    async fn get_project_commits(
        &self,
        identifier: &Identifier,
        options: &CommitListOptions,
    ) -> Result<Vec<Commit>> {
        let repo = self.get_repo(identifier).await?;
        if repo.owner.is_empty() || repo.name.is_empty() {
            return Err(Error::Upstream(format!(
                "could not determine owner and name for GitHub repository '{identifier}'"
            )));
        }

        let query = CommitQuery {
            sha: &options.sha,
            path: &options.path,
            author: &options.author,
            page: options.effective_page(),
            per_page: options.effective_per_page(self.per_page()),
        };

        let commits = self
            .client
            .list_commits(&repo.owner, &repo.name, &query)
            .await
            .map_err(|e| e.context(format!("list GitHub commits for {}", repo.full_name())))?;

        debug!(
            "Listed {} commits for {}, fetching stats",
            commits.len(),
            repo.full_name()
        );

        Ok(self.with_stats(&repo.owner, &repo.name, commits).await)
    }

    async fn get_repo_contributors(&self, identifier: &Identifier) -> Result<Vec<User>> {
        let repo = self.get_repo(identifier).await?;

        let contributors = self
            .client
            .list_contributors(&repo.owner, &repo.name, self.per_page())
            .await
            .map_err(|e| e.context(format!("list GitHub contributors for {}", repo.full_name())))?;

        Ok(contributors
            .into_iter()
            .filter_map(models::Contributor::into_user)
            .collect())
    }
}
