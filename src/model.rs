//! Provider-agnostic entities shared by every adapter and consumer.
//!
//! Field names on the wire are fixed: cached payloads are returned verbatim,
//! so renaming a field invalidates every entry still inside its TTL window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Repository information common to all providers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Repository {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    /// Login of the owning user, organization or namespace
    pub owner: String,
    #[serde(rename = "HTMLURL")]
    pub html_url: String,
    #[serde(rename = "CloneURL")]
    pub clone_url: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub stars: i64,
    pub forks: i64,
    pub open_issues: i64,
}

impl Repository {
    /// `owner/name` form of this repository
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Author data recorded in the commit itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    pub date: Option<DateTime<Utc>>,
    /// Provider account linked to the commit, empty when the provider has none
    #[serde(default)]
    pub login: String,
}

/// Line-change statistics, passed through as the provider reports them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommitStats {
    pub additions: i64,
    pub deletions: i64,
    pub total: i64,
}

impl CommitStats {
    pub fn new(additions: i64, deletions: i64, total: i64) -> Self {
        Self {
            additions,
            deletions,
            total,
        }
    }
}

impl AddAssign for CommitStats {
    fn add_assign(&mut self, other: Self) {
        self.additions = self.additions.saturating_add(other.additions);
        self.deletions = self.deletions.saturating_add(other.deletions);
        self.total = self.total.saturating_add(other.total);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Commit {
    #[serde(rename = "SHA")]
    pub sha: String,
    pub author: CommitAuthor,
    pub message: String,
    #[serde(rename = "HTMLURL")]
    pub html_url: String,
    pub stats: CommitStats,
}

/// User information; GitLab contributor listings only fill `name`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub login: String,
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "AvatarURL")]
    pub avatar_url: String,
    #[serde(rename = "HTMLURL")]
    pub html_url: String,
    pub name: String,
}

/// Filters and paging for commit listings. Empty strings and zero mean
/// "provider default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitListOptions {
    /// Branch, tag or commit SHA to start listing from
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

/// Page size used when the caller does not ask for one. Listings are a
/// single page, so repositories with more commits are truncated.
pub const DEFAULT_PER_PAGE: u32 = 100;

impl CommitListOptions {
    /// Page number with the provider default applied
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size with `default` applied for zero
    pub fn effective_per_page(&self, default: u32) -> u32 {
        if self.per_page == 0 {
            default
        } else {
            self.per_page
        }
    }
}
