//! GitHub REST API response shapes.
//!
//! Only the fields the adapter reads are modelled. Anything GitHub may omit
//! or send as `null` is optional so a sparse payload still decodes.

use crate::model;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// GitHub repository information
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub owner: Option<Account>,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub clone_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    #[serde(default)]
    pub open_issues_count: i64,
}

/// User or organization reference
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub id: i64,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
}

/// Entry of the commit listing and the single-commit endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub sha: String,
    #[serde(default)]
    pub html_url: String,
    pub commit: CommitDetails,
    /// GitHub account linked to the author email, absent for unknown emails
    pub author: Option<Account>,
    /// Only present on the single-commit endpoint
    pub stats: Option<Stats>,
}

/// Git-level commit data
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetails {
    #[serde(default)]
    pub message: String,
    pub author: Option<GitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub additions: i64,
    #[serde(default)]
    pub deletions: i64,
    #[serde(default)]
    pub total: i64,
}

/// Entry of the contributors listing
#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    pub login: Option<String>,
    pub id: Option<i64>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    /// Only set for anonymous contributors
    pub name: Option<String>,
}

impl From<Repository> for model::Repository {
    fn from(repo: Repository) -> Self {
        model::Repository {
            id: repo.id,
            name: repo.name,
            owner: repo.owner.map(|o| o.login).unwrap_or_default(),
            html_url: repo.html_url,
            clone_url: repo.clone_url.unwrap_or_default(),
            description: repo.description.unwrap_or_default(),
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count,
        }
    }
}

impl From<Stats> for model::CommitStats {
    fn from(stats: Stats) -> Self {
        model::CommitStats::new(stats.additions, stats.deletions, stats.total)
    }
}

impl Commit {
    /// Convert to the canonical commit with the given line statistics
    pub fn into_canonical(self, stats: model::CommitStats) -> model::Commit {
        let login = self
            .author
            .as_ref()
            .map(|a| a.login.clone())
            .unwrap_or_default();

        let author = match self.commit.author {
            Some(git_author) => model::CommitAuthor {
                name: git_author.name,
                email: git_author.email,
                date: git_author.date,
                login,
            },
            // No git author data, fall back to the linked account
            None => model::CommitAuthor {
                name: login.clone(),
                email: String::new(),
                date: None,
                login,
            },
        };

        model::Commit {
            sha: self.sha,
            author,
            message: self.commit.message,
            html_url: self.html_url,
            stats,
        }
    }
}

impl Contributor {
    /// Contributors without a login (anonymous) have no user to map to
    pub fn into_user(self) -> Option<model::User> {
        let login = self.login.filter(|l| !l.is_empty())?;
        Some(model::User {
            login,
            id: self.id.unwrap_or_default(),
            avatar_url: self.avatar_url.unwrap_or_default(),
            html_url: self.html_url.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
        })
    }
}
