use crate::github::{
    config::GitHubConfig,
    models::{Commit, Contributor, Repository},
};
use crate::metrics::{CallStatus, Metrics};
use crate::rate_limiter::{RateLimitHeaders, RateLimiter};
use crate::service::Provider;
use crate::{Error, Result};
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Query filters for the commit listing endpoint
#[derive(Debug, Clone, Default)]
pub struct CommitQuery<'a> {
    pub sha: &'a str,
    pub path: &'a str,
    pub author: &'a str,
    pub page: u32,
    pub per_page: u32,
}

/// GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
    rate_limiter: RateLimiter,
    metrics: Arc<Metrics>,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: GitHubConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("gitstats/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );

        if let Some(token) = &config.token {
            let auth_value = format!("Bearer {token}");
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("Invalid GitHub token: {e}")))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        let rate_limiter = RateLimiter::new(RateLimitHeaders::GITHUB, config.rate_limit_buffer);

        Ok(Self {
            client,
            config,
            rate_limiter,
            metrics,
        })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Make a GET request to GitHub API, recording the call under `endpoint`
    async fn get<T>(&self, endpoint: &'static str, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let started = Instant::now();
        let result = self.send_get(path, query).await;
        self.metrics.record_api_call(
            Provider::GitHub,
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
        // Wait if we're approaching rate limit
        self.rate_limiter.wait_if_needed().await;

        let url = format!("{}{}", self.config.api_base_url(), path);
        debug!("GitHub API request: GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("GitHub API request failed: {e}")))?;

        self.rate_limiter
            .update_from_headers(response.headers())
            .await;

        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            error!("GitHub API error: {} - {}", status, error_body);

            return Err(match status {
                StatusCode::NOT_FOUND => Error::NotFound(format!("GitHub resource {path}")),
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                    Error::Upstream("GitHub API rate limit exceeded or access denied".to_string())
                }
                StatusCode::UNAUTHORIZED => {
                    Error::Upstream("GitHub authentication failed".to_string())
                }
                _ => Error::Upstream(format!("GitHub API error: {status}")),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to read GitHub API response: {e}")))?;

        // Listings of empty repositories answer 204 with no body
        let body: &[u8] = if status == StatusCode::NO_CONTENT && body.is_empty() {
            b"[]"
        } else {
            &body
        };

        serde_json::from_slice(body)
            .map_err(|e| Error::Upstream(format!("Failed to parse GitHub API response: {e}")))
    }

    /// Repositories the authenticated user owns, collaborates on or can see
    /// through organization membership
    pub async fn list_authenticated_repositories(&self, per_page: u32) -> Result<Vec<Repository>> {
        self.get(
            "list_repos",
            "/user/repos",
            &[
                ("affiliation", "owner,collaborator,organization_member".to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    pub async fn list_org_repositories(&self, org: &str, per_page: u32) -> Result<Vec<Repository>> {
        let path = format!("/orgs/{}/repos", urlencoding::encode(org));
        self.get(
            "list_org_repos",
            &path,
            &[("type", "all".to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    pub async fn list_user_repositories(&self, user: &str, per_page: u32) -> Result<Vec<Repository>> {
        let path = format!("/users/{}/repos", urlencoding::encode(user));
        self.get(
            "list_user_repos",
            &path,
            &[("type", "all".to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    /// Get repository information
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        let path = format!(
            "/repos/{}/{}",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        self.get("get_repo", &path, &[]).await
    }

    pub async fn get_repository_by_id(&self, id: i64) -> Result<Repository> {
        let path = format!("/repositories/{id}");
        self.get("get_repo", &path, &[]).await
    }

    /// One page of the commit listing (no stats on the entries)
    pub async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        query: &CommitQuery<'_>,
    ) -> Result<Vec<Commit>> {
        let path = format!(
            "/repos/{}/{}/commits",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );

        let mut params = vec![
            ("per_page", query.per_page.to_string()),
            ("page", query.page.to_string()),
        ];
        if !query.sha.is_empty() {
            params.push(("sha", query.sha.to_string()));
        }
        if !query.path.is_empty() {
            params.push(("path", query.path.to_string()));
        }
        if !query.author.is_empty() {
            params.push(("author", query.author.to_string()));
        }

        self.get("list_commits", &path, &params).await
    }

    /// Get commit information including line statistics
    pub async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<Commit> {
        let path = format!(
            "/repos/{}/{}/commits/{}",
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            urlencoding::encode(sha)
        );
        self.get("get_commit", &path, &[]).await
    }

    pub async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<Contributor>> {
        let path = format!(
            "/repos/{}/{}/contributors",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        self.get("list_contributors", &path, &[("per_page", per_page.to_string())])
            .await
    }
}
