//! Cache key derivation: `{provider}_{operation}_{normalized-parameters}`.
//!
//! Identical logical requests must map to the same key, so parameters are
//! normalized (canonical identifier form, provider paging defaults applied)
//! before they are rendered.

use crate::model::CommitListOptions;
use crate::service::{Identifier, Provider};

/// `owner` is expected trimmed; it is rendered as given
pub fn all_repos(provider: Provider, owner: &str) -> String {
    format!("{provider}_get_all_repos_{owner}")
}

pub fn repo(provider: Provider, identifier: &Identifier) -> String {
    format!("{provider}_get_repo_{identifier}")
}

/// `default_per_page` is the adapter's page size, substituted for zero
pub fn commits(
    provider: Provider,
    identifier: &Identifier,
    options: &CommitListOptions,
    default_per_page: u32,
) -> String {
    format!(
        "{provider}_get_commits_{identifier}_sha={}&path={}&author={}&page={}&per_page={}",
        urlencoding::encode(&options.sha),
        urlencoding::encode(&options.path),
        urlencoding::encode(&options.author),
        options.effective_page(),
        options.effective_per_page(default_per_page),
    )
}

pub fn contributors(provider: Provider, identifier: &Identifier) -> String {
    format!("{provider}_get_contributors_{identifier}")
}

pub fn lines_of_code(provider: Provider, clone_url: &str) -> String {
    format!("{provider}_get_loc_{}", clone_url.trim())
}
