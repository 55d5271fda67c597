//! Total line count of a repository's tracked files.
//!
//! The repository is shallow-cloned into a temporary directory that is
//! removed on every exit path, including timeouts and dropped requests.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCount {
    #[serde(rename = "totalLines")]
    pub total_lines: u64,
}

#[derive(Debug, Clone)]
pub struct LineCounter {
    timeout: Duration,
}

impl LineCounter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn count(&self, clone_url: &str) -> Result<LineCount> {
        validate_clone_url(clone_url)?;

        tokio::time::timeout(self.timeout, self.clone_and_count(clone_url))
            .await
            .map_err(|_| {
                Error::LineCount(format!(
                    "timed out after {}s counting {clone_url}",
                    self.timeout.as_secs()
                ))
            })?
    }

    async fn clone_and_count(&self, clone_url: &str) -> Result<LineCount> {
        let workdir = tempfile::tempdir()?;
        let checkout = workdir.path().join("repo");
        let checkout_arg = checkout.to_string_lossy().into_owned();

        info!("Cloning {} for line count", clone_url);
        run_git(
            &["clone", "--depth", "1", "--quiet", clone_url, &checkout_arg],
            workdir.path(),
        )
        .await?;

        let listing = run_git(&["ls-files", "-z"], &checkout).await?;
        let files: Vec<String> = listing
            .split(|b| *b == 0)
            .filter(|name| !name.is_empty())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect();

        let total_lines = sum_lines(&checkout, &files).await;
        debug!("{} tracked files, {} lines in {}", files.len(), total_lines, clone_url);

        Ok(LineCount { total_lines })
    }
}

/// Only remote http(s) URLs are cloned
pub fn validate_clone_url(clone_url: &str) -> Result<()> {
    let parsed = url::Url::parse(clone_url)
        .map_err(|e| Error::Validation(format!("Invalid repository URL '{clone_url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        scheme => Err(Error::Validation(format!(
            "Unsupported repository URL scheme '{scheme}'"
        ))),
    }
}

async fn run_git(args: &[&str], cwd: &Path) -> Result<Vec<u8>> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::LineCount(format!(
            "git {} exited with {}: {}",
            args.first().copied().unwrap_or_default(),
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

/// Newline count over `files` relative to `root`. Unreadable entries
/// (submodules, dangling symlinks) are skipped.
async fn sum_lines(root: &Path, files: &[String]) -> u64 {
    let mut total = 0;
    for name in files {
        match tokio::fs::read(root.join(name)).await {
            Ok(bytes) => total += count_newlines(&bytes),
            Err(e) => debug!("Skipping {}: {}", name, e),
        }
    }
    total
}

fn count_newlines(bytes: &[u8]) -> u64 {
    bytes.iter().filter(|b| **b == b'\n').count() as u64
}
