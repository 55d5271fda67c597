use crate::gitlab::{
    client::{CommitQuery, GitLabClient},
    config::GitLabConfig,
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

/// [`GitService`] backed by the GitLab REST API v4
#[derive(Clone)]
pub struct GitLabService {
    client: GitLabClient,
    metrics: Arc<Metrics>,
}

impl GitLabService {
    pub fn new(config: GitLabConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let client = GitLabClient::new(config, metrics.clone())?;
        Ok(Self { client, metrics })
    }

    fn per_page(&self) -> u32 {
        self.client.config().per_page
    }

    /// Listings normally carry stats; commits without them get a detail fetch
    async fn with_stats(&self, project_id: i64, commits: Vec<models::Commit>) -> Vec<Commit> {
        let concurrency = self.client.config().detail_concurrency.max(1);

        stream::iter(commits)
            .map(|commit| async move {
                let stats = match commit.stats {
                    Some(stats) => stats.into(),
                    None => self.fetch_stats(project_id, &commit.id).await,
                };
                commit.into_canonical(stats)
            })
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn fetch_stats(&self, project_id: i64, sha: &str) -> CommitStats {
        match self.client.get_commit(project_id, sha).await {
            Ok(models::Commit {
                stats: Some(stats), ..
            }) => stats.into(),
            Ok(_) => {
                warn!(
                    "Commit {} in project {} has no stats, using zero",
                    sha, project_id
                );
                self.metrics.record_stat_fallback();
                CommitStats::default()
            }
            Err(e) => {
                warn!(
                    "Could not fetch stats for commit {} in project {}: {}. Using zero",
                    sha,
                    project_id,
                    e.log_safe()
                );
                self.metrics.record_stat_fallback();
                CommitStats::default()
            }
        }
    }
}

#[async_trait]
impl GitService for GitLabService {
    fn provider(&self) -> Provider {
        Provider::GitLab
    }

    async fn get_all_repos(&self, owner: &str) -> Result<Vec<Repository>> {
        let projects = if owner.is_empty() {
            self.client.list_member_projects(self.per_page()).await
        } else {
            match self.client.list_group_projects(owner, self.per_page()).await {
                Err(Error::NotFound(_)) => {
                    debug!("{} is not a group, listing user projects", owner);
                    self.client.list_user_projects(owner, self.per_page()).await
                }
                other => other,
            }
        }
        .map_err(|e| e.context(format!("list GitLab projects (owner: '{owner}')")))?;

        info!("Fetched {} GitLab projects (owner: '{}')", projects.len(), owner);
        Ok(projects.into_iter().map(Repository::from).collect())
    }

    async fn get_repo(&self, identifier: &Identifier) -> Result<Repository> {
        let project_ref = match identifier {
            Identifier::Id(id) => id.to_string(),
            Identifier::Path { owner, name } => format!("{owner}/{name}"),
        };

        let result = self.client.get_project(&project_ref).await;

        self.metrics
            .record_repository_fetch(Provider::GitLab, CallStatus::from_ok(result.is_ok()));

        result
            .map(Repository::from)
            .map_err(|e| e.context(format!("get GitLab project '{identifier}'")))
    }

    async fn get_project_commits(
        &self,
        identifier: &Identifier,
        options: &CommitListOptions,
    ) -> Result<Vec<Commit>> {
        let project = self.get_repo(identifier).await?;

        let query = CommitQuery {
            ref_name: &options.sha,
            path: &options.path,
            author: &options.author,
            page: options.effective_page(),
            per_page: options.effective_per_page(self.per_page()),
        };

        let commits = self
            .client
            .list_commits(project.id, &query)
            .await
            .map_err(|e| e.context(format!("list GitLab commits for {}", project.full_name())))?;

        debug!("Listed {} commits for {}", commits.len(), project.full_name());

        Ok(self.with_stats(project.id, commits).await)
    }

    async fn get_repo_contributors(&self, identifier: &Identifier) -> Result<Vec<User>> {
        let project = self.get_repo(identifier).await?;

        let contributors = self
            .client
            .list_contributors(project.id, self.per_page())
            .await
            .map_err(|e| {
                e.context(format!("list GitLab contributors for {}", project.full_name()))
            })?;

        Ok(contributors.into_iter().map(User::from).collect())
    }
}
