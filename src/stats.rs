//! Per-author commit statistics.

use crate::model::{Commit, CommitStats};
use std::collections::BTreeMap;
use tracing::debug;

/// Author key to summed statistics, ordered by author key
pub type AuthorStats = BTreeMap<String, CommitStats>;

/// Running per-author totals.
///
/// Commits are keyed by the provider login when present, else by the trimmed
/// author name. Commits with neither are skipped. Commits are not deduplicated
/// by SHA: feeding the same commit twice counts it twice.
#[derive(Debug, Default)]
pub struct Aggregator {
    totals: AuthorStats,
    skipped: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, commit: &Commit) {
        let Some(key) = author_key(commit) else {
            debug!("Skipping commit {} with no author identity", commit.sha);
            self.skipped += 1;
            return;
        };

        *self.totals.entry(key.to_string()).or_default() += commit.stats;
    }

    /// Commits skipped so far for lack of an author
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn finish(self) -> AuthorStats {
        self.totals
    }
}

fn author_key(commit: &Commit) -> Option<&str> {
    let login = commit.author.login.trim();
    if !login.is_empty() {
        return Some(login);
    }
    let name = commit.author.name.trim();
    (!name.is_empty()).then_some(name)
}

pub fn aggregate<'a>(commits: impl IntoIterator<Item = &'a Commit>) -> AuthorStats {
    let mut aggregator = Aggregator::new();
    for commit in commits {
        aggregator.add(commit);
    }
    aggregator.finish()
}
