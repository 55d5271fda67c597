//! The capability contract every provider adapter implements.
//!
//! Consumers (the cache-aside layer, aggregation, dispatch) only ever see
//! [`GitService`], [`Identifier`] and the canonical model.

use crate::model::{Commit, CommitListOptions, Repository, User};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported Git hosting providers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "github")]
    GitHub,
    #[value(name = "gitlab")]
    GitLab,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::GitHub, Provider::GitLab];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository reference accepted at the service boundary.
///
/// A string of decimal digits is a provider-native numeric ID; anything else
/// must be `owner/name` (GitLab: `namespace/path`) with exactly one `/` and
/// two non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Id(i64),
    Path { owner: String, name: String },
}

impl Identifier {
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::InvalidIdentifier(
                "repository identifier is empty".to_string(),
            ));
        }

        if input.bytes().all(|b| b.is_ascii_digit()) {
            return input.parse::<i64>().map(Identifier::Id).map_err(|_| {
                Error::InvalidIdentifier(format!("numeric repository ID out of range: '{input}'"))
            });
        }

        let parts: Vec<&str> = input.split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Identifier::Path {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(Error::InvalidIdentifier(format!(
                "expected a numeric ID or 'owner/name', got '{input}'"
            ))),
        }
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Identifier::parse(s)
    }
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Identifier::Id(id)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Id(id) => write!(f, "{id}"),
            Identifier::Path { owner, name } => write!(f, "{owner}/{name}"),
        }
    }
}

/// Read operations offered by a Git provider
#[async_trait]
pub trait GitService: Send + Sync {
    fn provider(&self) -> Provider;

    /// Repositories under `owner`, or every repository reachable by the
    /// authenticated account when `owner` is empty
    async fn get_all_repos(&self, owner: &str) -> Result<Vec<Repository>>;

    async fn get_repo(&self, identifier: &Identifier) -> Result<Repository>;

    /// One page of commits with line statistics filled in
    async fn get_project_commits(
        &self,
        identifier: &Identifier,
        options: &CommitListOptions,
    ) -> Result<Vec<Commit>>;

    async fn get_repo_contributors(&self, identifier: &Identifier) -> Result<Vec<User>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_route_to_id() {
        assert_eq!(Identifier::parse("12345").unwrap(), Identifier::Id(12345));
        assert_eq!(Identifier::parse("007").unwrap(), Identifier::Id(7));
    }

    #[test]
    fn test_owner_name_routes_to_path() {
        assert_eq!(
            Identifier::parse("octo/hello-world").unwrap(),
            Identifier::Path {
                owner: "octo".to_string(),
                name: "hello-world".to_string()
            }
        );
        // digits on either side of the slash are still a path
        assert!(matches!(
            Identifier::parse("123/456").unwrap(),
            Identifier::Path { .. }
        ));
    }

    #[test]
    fn test_malformed_identifiers_rejected() {
        for input in [
            "",
            "octo",
            "/hello",
            "octo/",
            "/",
            "a/b/c",
            "-5",
            "99999999999999999999",
        ] {
            let result = Identifier::parse(input);
            assert!(
                matches!(result, Err(Error::InvalidIdentifier(_))),
                "expected InvalidIdentifier for {input:?}"
            );
        }
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(Identifier::parse("0042").unwrap().to_string(), "42");
        assert_eq!(Identifier::parse("a/b").unwrap().to_string(), "a/b");
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(Provider::GitHub.to_string(), "github");
        assert_eq!(
            serde_json::from_str::<Provider>("\"gitlab\"").unwrap(),
            Provider::GitLab
        );
    }
}
