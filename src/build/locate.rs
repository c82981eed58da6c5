//! Finding the checkouts a build runs in

use std::path::PathBuf;

use crate::config::{Config, RepositoryConfig};
use crate::error::{EtzError, Result};
use crate::repo_type::{self, RepoType};
use crate::validation::{validate_label, validate_repo_name};

/// Worktree of `repo` under `label`, which must exist
pub(crate) fn repo_worktree(config: &Config, label: &str, repo: &str) -> Result<PathBuf> {
    validate_label(label)?;
    validate_repo_name(repo)?;
    if config.repository(repo).is_none() {
        return Err(EtzError::Validation(format!("Unknown repository '{repo}'")));
    }

    let path = config.worktree_path(label, repo);
    if !path.is_dir() {
        return Err(EtzError::WorktreeNotFound(format!("{label}/{repo}")));
    }
    Ok(path)
}

/// The infra repository and the checkout to use for it: its worktree under
/// `label` when present, otherwise the primary clone
pub(crate) fn infra_checkout<'a>(
    config: &'a Config,
    label: &str,
) -> Option<(&'a RepositoryConfig, PathBuf)> {
    config.repositories.iter().find_map(|repo| {
        let worktree = config.worktree_path(label, &repo.name);
        let checkout = if worktree.is_dir() {
            worktree
        } else {
            repo.base_path.clone()
        };
        (repo_type::detect_with_name(&checkout, &repo.name) == RepoType::Infra)
            .then_some((repo, checkout))
    })
}
