use crate::model::CommitListOptions;
use crate::service::Provider;
use serde::{Deserialize, Serialize};

/// `?owner=` for repository listings; empty means the authenticated principal
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerParams {
    #[serde(default)]
    pub owner: String,
}

/// `?id=` naming one repository, numeric or `owner/name`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoParams {
    #[serde(default)]
    pub id: String,
}

/// Commit listing query parameters
// Spelled out rather than flattening CommitListOptions: serde's flatten
// loses the string-to-number coercion query strings rely on
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitParams {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
}

impl CommitParams {
    pub fn options(&self) -> CommitListOptions {
        CommitListOptions {
            sha: self.sha.clone(),
            path: self.path.clone(),
            author: self.author.clone(),
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// `?repoUrl=` for line counts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocParams {
    #[serde(default, rename = "repoUrl")]
    pub repo_url: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub providers: Vec<Provider>,
}
