use crate::gitlab::{
    config::GitLabConfig,
    models::{Commit, Contributor, Project},
};
use crate::metrics::{CallStatus, Metrics};
use crate::rate_limiter::{RateLimitHeaders, RateLimiter};
use crate::service::Provider;
use crate::{Error, Result};
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Query filters for the repository commits endpoint
#[derive(Debug, Clone, Default)]
pub struct CommitQuery<'a> {
    pub ref_name: &'a str,
    pub path: &'a str,
    pub author: &'a str,
    pub page: u32,
    pub per_page: u32,
}

/// GitLab API v4 client
#[derive(Clone)]
pub struct GitLabClient {
    client: Client,
    config: GitLabConfig,
    base_url: String,
    rate_limiter: RateLimiter,
    metrics: Arc<Metrics>,
}

impl GitLabClient {
    pub fn new(config: GitLabConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("gitstats/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(token) = &config.token {
            headers.insert(
                header::HeaderName::from_static("private-token"),
                header::HeaderValue::from_str(token)
                    .map_err(|e| Error::Config(format!("Invalid GitLab token: {e}")))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        let rate_limiter = RateLimiter::new(RateLimitHeaders::GITLAB, config.rate_limit_buffer);
        let base_url = config.api_base_url();

        Ok(Self {
            client,
            config,
            base_url,
            rate_limiter,
            metrics,
        })
    }

    pub fn config(&self) -> &GitLabConfig {
        &self.config
    }

    async fn get<T>(&self, endpoint: &'static str, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let started = Instant::now();
        let result = self.send_get(path, query).await;
        self.metrics.record_api_call(
            Provider::GitLab,
            endpoint,
            CallStatus::from_ok(result.is_ok()),
            started.elapsed(),
        );
        result
    }

    async fn send_get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.rate_limiter.wait_if_needed().await;

        let url = format!("{}{}", self.base_url, path);
        debug!("GitLab API request: GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("GitLab API request failed: {e}")))?;

        self.rate_limiter
            .update_from_headers(response.headers())
            .await;

        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            error!("GitLab API error: {} - {}", status, error_body);

            return Err(match status {
                StatusCode::NOT_FOUND => Error::NotFound(format!("GitLab resource {path}")),
                StatusCode::TOO_MANY_REQUESTS => {
                    Error::Upstream("GitLab API rate limit exceeded".to_string())
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::Upstream("GitLab authentication failed".to_string())
                }
                _ => Error::Upstream(format!("GitLab API error: {status}")),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse GitLab API response: {e}")))
    }

    /// Projects the authenticated user is a member of
    pub async fn list_member_projects(&self, per_page: u32) -> Result<Vec<Project>> {
        self.get(
            "list_repos",
            "/projects",
            &[
                ("membership", "true".to_string()),
                ("order_by", "last_activity_at".to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    pub async fn list_group_projects(&self, group: &str, per_page: u32) -> Result<Vec<Project>> {
        let path = format!("/groups/{}/projects", urlencoding::encode(group));
        self.get(
            "list_group_repos",
            &path,
            &[
                ("include_subgroups", "true".to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    pub async fn list_user_projects(&self, user: &str, per_page: u32) -> Result<Vec<Project>> {
        let path = format!("/users/{}/projects", urlencoding::encode(user));
        self.get("list_user_repos", &path, &[("per_page", per_page.to_string())])
            .await
    }

    /// Get a project by numeric ID or `namespace/path`
    pub async fn get_project(&self, project: &str) -> Result<Project> {
        let path = format!("/projects/{}", urlencoding::encode(project));
        self.get("get_repo", &path, &[]).await
    }

    /// One page of commits, requesting inline stats
    pub async fn list_commits(&self, project_id: i64, query: &CommitQuery<'_>) -> Result<Vec<Commit>> {
        let path = format!("/projects/{project_id}/repository/commits");

        let mut params = vec![
            ("with_stats", "true".to_string()),
            ("per_page", query.per_page.to_string()),
            ("page", query.page.to_string()),
        ];
        if !query.ref_name.is_empty() {
            params.push(("ref_name", query.ref_name.to_string()));
        }
        if !query.path.is_empty() {
            params.push(("path", query.path.to_string()));
        }
        if !query.author.is_empty() {
            params.push(("author", query.author.to_string()));
        }

        self.get("list_commits", &path, &params).await
    }

    /// Single commit; GitLab includes stats here by default
    pub async fn get_commit(&self, project_id: i64, sha: &str) -> Result<Commit> {
        let path = format!(
            "/projects/{project_id}/repository/commits/{}",
            urlencoding::encode(sha)
        );
        self.get("get_commit", &path, &[]).await
    }

    pub async fn list_contributors(&self, project_id: i64, per_page: u32) -> Result<Vec<Contributor>> {
        let path = format!("/projects/{project_id}/repository/contributors");
        self.get("list_contributors", &path, &[("per_page", per_page.to_string())])
            .await
    }
}
