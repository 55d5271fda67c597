pub mod commands;

use crate::service::Provider;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gitstats")]
#[command(about = "Per-author commit statistics across GitHub and GitLab", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// List repositories
    Repos {
        /// Only this provider (default: every configured provider)
        #[arg(long, value_enum)]
        provider: Option<Provider>,

        /// Organization, group or user; empty lists your own repositories
        #[arg(long, default_value = "")]
        owner: String,
    },

    /// Per-author additions and deletions
    Stats {
        /// Only this provider (default: every configured provider)
        #[arg(long, value_enum)]
        provider: Option<Provider>,

        /// Numeric ID or owner/name; without it every repository is walked
        #[arg(long)]
        project: Option<String>,

        #[command(flatten)]
        filter: CommitFilter,
    },

    /// List repository contributors
    Contributors {
        #[arg(long, value_enum)]
        provider: Provider,

        /// Numeric ID or owner/name
        #[arg(long)]
        project: String,
    },

    /// Count lines of tracked files in a repository
    Loc {
        /// http(s) clone URL
        url: String,

        /// Provider whose cache namespace to use
        #[arg(long, value_enum)]
        provider: Option<Provider>,
    },
}

/// Commit listing filters shared by the stats command
#[derive(Args, Debug, Clone, Default)]
pub struct CommitFilter {
    /// Branch, tag or commit SHA
    #[arg(long, default_value = "")]
    pub sha: String,

    /// Only commits touching this path
    #[arg(long, default_value = "")]
    pub path: String,

    /// Only commits by this author
    #[arg(long, default_value = "")]
    pub author: String,

    /// Commits per page (0 uses the provider default)
    #[arg(long, default_value_t = 0)]
    pub per_page: u32,

    /// Page number (0 or 1 is the first page)
    #[arg(long, default_value_t = 0)]
    pub page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stats_command() {
        let cli = Cli::parse_from([
            "gitstats",
            "stats",
            "--provider",
            "gitlab",
            "--project",
            "group/app",
            "--per-page",
            "50",
        ]);

        match cli.command {
            Commands::Stats {
                provider,
                project,
                filter,
            } => {
                assert_eq!(provider, Some(Provider::GitLab));
                assert_eq!(project.as_deref(), Some("group/app"));
                assert_eq!(filter.per_page, 50);
                assert_eq!(filter.sha, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_contributors_requires_provider() {
        let result = Cli::try_parse_from(["gitstats", "contributors", "--project", "o/r"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result = Cli::try_parse_from(["gitstats", "repos", "--provider", "bitbucket"]);
        assert!(result.is_err());
    }
}
