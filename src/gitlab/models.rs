//! GitLab REST API v4 response shapes.

use crate::model;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// GitLab project
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub web_url: String,
    pub http_url_to_repo: Option<String>,
    /// Only set for projects in a personal namespace
    pub owner: Option<ProjectOwner>,
    pub namespace: Option<Namespace>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub star_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    /// Absent when issues are disabled on the project
    pub open_issues_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectOwner {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Namespace {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub full_path: String,
}

/// Commit as returned by the commit listing and single-commit endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    pub authored_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub web_url: String,
    /// Included in listings when `with_stats=true`
    pub stats: Option<Stats>,
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

/// Entry of the repository contributors listing
#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    #[serde(default)]
    pub name: String,
}

impl Project {
    /// Owner username, or the full namespace path (`group/subgroup`) for group projects
    fn owner_login(&self) -> String {
        self.owner
            .as_ref()
            .map(|o| o.username.clone())
            .filter(|u| !u.is_empty())
            .or_else(|| self.namespace.as_ref().map(Namespace::owner_path))
            .unwrap_or_default()
    }
}

impl Namespace {
    fn owner_path(&self) -> String {
        if self.full_path.is_empty() {
            self.path.clone()
        } else {
            self.full_path.clone()
        }
    }
}

impl From<Project> for model::Repository {
    fn from(project: Project) -> Self {
        let owner = project.owner_login();
        model::Repository {
            id: project.id,
            name: project.name,
            owner,
            html_url: project.web_url,
            clone_url: project.http_url_to_repo.unwrap_or_default(),
            description: project.description.unwrap_or_default(),
            created_at: project.created_at,
            updated_at: project.last_activity_at,
            stars: project.star_count,
            forks: project.forks_count,
            open_issues: project.open_issues_count.unwrap_or_default(),
        }
    }
}

impl From<Stats> for model::CommitStats {
    fn from(stats: Stats) -> Self {
        model::CommitStats::new(stats.additions, stats.deletions, stats.total)
    }
}

impl Commit {
    pub fn into_canonical(self, stats: model::CommitStats) -> model::Commit {
        model::Commit {
            sha: self.id,
            author: model::CommitAuthor {
                name: self.author_name,
                email: self.author_email,
                date: self.authored_date,
                login: String::new(),
            },
            message: self.message,
            html_url: self.web_url,
            stats,
        }
    }
}

impl From<Contributor> for model::User {
    fn from(contributor: Contributor) -> Self {
        model::User {
            name: contributor.name,
            ..Default::default()
        }
    }
}
