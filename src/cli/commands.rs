use crate::cache::CachedService;
use crate::cli::CommitFilter;
use crate::loc::LineCount;
use crate::model::{CommitListOptions, Repository, User};
use crate::registry::Services;
use crate::service::{Identifier, Provider};
use crate::stats::{Aggregator, AuthorStats};
use crate::{Error, Result};
use tracing::warn;

impl From<CommitFilter> for CommitListOptions {
    fn from(filter: CommitFilter) -> Self {
        Self {
            sha: filter.sha,
            path: filter.path,
            author: filter.author,
            page: filter.page,
            per_page: filter.per_page,
        }
    }
}

/// The requested provider, or every configured one
fn select(services: &Services, provider: Option<Provider>) -> Result<Vec<&CachedService>> {
    let selected = match provider {
        Some(provider) => vec![services.provider(provider)?],
        None => services.iter().collect(),
    };

    if selected.is_empty() {
        return Err(Error::Config(
            "No provider configured; set GITHUB_TOKEN or GITLAB_TOKEN".to_string(),
        ));
    }
    Ok(selected)
}

/// List repositories for each selected provider. A failing provider is
/// reported and skipped.
pub async fn list_repos(services: &Services, provider: Option<Provider>, owner: &str) -> Result<()> {
    for service in select(services, provider)? {
        match service.repositories(owner).await {
            Ok(repos) => print_repositories(service.provider(), &repos),
            Err(e) => {
                warn!("Listing {} repositories failed: {}", service.provider(), e.log_safe());
                eprintln!("✗ {}: {}", service.provider(), e);
            }
        }
    }
    Ok(())
}

/// Per-author totals for one project, or for every repository of every
/// selected provider when `project` is `None`
pub async fn stats(
    services: &Services,
    provider: Option<Provider>,
    project: Option<&str>,
    options: &CommitListOptions,
) -> Result<()> {
    match project {
        Some(project) => {
            let identifier = Identifier::parse(project)?;
            for service in select(services, provider)? {
                match service.author_stats(&identifier, options).await {
                    Ok(stats) => {
                        println!("{} {}", service.provider(), identifier);
                        print_author_stats(&stats);
                    }
                    Err(e) => eprintln!("✗ {} {}: {}", service.provider(), identifier, e),
                }
            }
        }
        None => {
            for service in select(services, provider)? {
                walk_repositories(service, options).await;
            }
        }
    }
    Ok(())
}

/// Fold every repository of one provider into per-repository and overall
/// totals, continuing past failures
async fn walk_repositories(service: &CachedService, options: &CommitListOptions) {
    let provider = service.provider();
    let repos = match service.repositories("").await {
        Ok(repos) => repos,
        Err(e) => {
            eprintln!("✗ {provider}: {e}");
            return;
        }
    };

    let mut overall = Aggregator::new();
    let mut failed = 0;

    for repo in &repos {
        let identifier = Identifier::Id(repo.id);
        let commits = match service.commits(&identifier, options).await {
            Ok(commits) => commits,
            Err(e) => {
                failed += 1;
                eprintln!("✗ {provider} {}: {}", repo.full_name(), e);
                continue;
            }
        };

        let mut per_repo = Aggregator::new();
        for commit in &commits {
            per_repo.add(commit);
            overall.add(commit);
        }

        println!("{provider} {} ({} commits)", repo.full_name(), commits.len());
        print_author_stats(&per_repo.finish());
    }

    println!(
        "{provider} total across {} repositories ({} failed)",
        repos.len() - failed,
        failed
    );
    print_author_stats(&overall.finish());
}

pub async fn contributors(services: &Services, provider: Provider, project: &str) -> Result<()> {
    let service = services.provider(provider)?;
    let identifier = Identifier::parse(project)?;
    let bytes = service.repo_contributors(&identifier).await?;
    let users: Vec<User> = serde_json::from_slice(&bytes)?;

    for user in &users {
        if user.login.is_empty() {
            println!("  {}", user.name);
        } else {
            println!("  {:<24} {}", user.login, user.html_url);
        }
    }
    println!("✓ {} contributors", users.len());
    Ok(())
}

pub async fn lines_of_code(
    services: &Services,
    provider: Option<Provider>,
    clone_url: &str,
) -> Result<()> {
    let service = select(services, provider)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Config("No provider configured".to_string()))?;

    let bytes = service.lines_of_code(clone_url).await?;
    let count: LineCount = serde_json::from_slice(&bytes)?;
    println!("✓ {}: {} lines", clone_url, count.total_lines);
    Ok(())
}

fn print_repositories(provider: Provider, repos: &[Repository]) {
    println!("{} ({} repositories)", provider, repos.len());
    for repo in repos {
        println!(
            "  {:>10}  {:<40} ★{:<6} {}",
            repo.id,
            repo.full_name(),
            repo.stars,
            repo.html_url
        );
    }
}

fn print_author_stats(stats: &AuthorStats) {
    if stats.is_empty() {
        println!("  (no commits)");
        return;
    }
    for (author, s) in stats {
        println!(
            "  {:<30} +{:<8} -{:<8} {}",
            author, s.additions, s.deletions, s.total
        );
    }
}
