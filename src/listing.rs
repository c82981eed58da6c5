//! Worktree group listing
//!
//! Every call probes the filesystem and git afresh; nothing is cached.

use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{Config, RepositoryConfig};
use crate::error::Result;
use crate::git::GitOps;
use crate::validation::validate_label;

/// State of one repository's worktree under a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoWorktreeState {
    pub name: String,
    pub path: PathBuf,
    pub branch: Option<String>,
    pub clean: bool,
    pub uncommitted: usize,
    pub exists: bool,
}

/// All repositories of one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeGroup {
    pub label: String,
    pub repos: Vec<RepoWorktreeState>,
}

impl WorktreeGroup {
    /// Repositories whose worktree exists
    pub fn existing(&self) -> impl Iterator<Item = &RepoWorktreeState> {
        self.repos.iter().filter(|r| r.exists)
    }

    pub fn is_clean(&self) -> bool {
        self.existing().all(|r| r.clean)
    }
}

/// Every label directory under the worktree root, sorted by name
pub fn list_all<G: GitOps + ?Sized>(config: &Config, git: &G) -> Result<Vec<WorktreeGroup>> {
    let Ok(entries) = fs::read_dir(&config.worktree_root) else {
        debug!(
            "Worktree root {} not readable, no groups",
            config.worktree_root.display()
        );
        return Ok(Vec::new());
    };

    let mut labels: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    labels.sort();

    Ok(labels
        .into_iter()
        .map(|label| probe_group(config, git, label))
        .collect())
}

/// One label's group, or `None` when its directory is absent
pub fn get_one<G: GitOps + ?Sized>(
    config: &Config,
    git: &G,
    label: &str,
) -> Result<Option<WorktreeGroup>> {
    validate_label(label)?;
    if !config.label_dir(label).is_dir() {
        return Ok(None);
    }
    Ok(Some(probe_group(config, git, label.to_string())))
}

fn probe_group<G: GitOps + ?Sized>(config: &Config, git: &G, label: String) -> WorktreeGroup {
    let repos = config
        .repositories
        .iter()
        .map(|repo| probe_repo(config, git, &label, repo))
        .collect();
    WorktreeGroup { label, repos }
}

fn probe_repo<G: GitOps + ?Sized>(
    config: &Config,
    git: &G,
    label: &str,
    repo: &RepositoryConfig,
) -> RepoWorktreeState {
    let path = config.worktree_path(label, &repo.name);
    let missing = |path: PathBuf| RepoWorktreeState {
        name: repo.name.clone(),
        path,
        branch: None,
        clean: true,
        uncommitted: 0,
        exists: false,
    };

    if !path.join(".git").exists() {
        return missing(path);
    }

    let status = match git.get_status(&path) {
        Ok(status) => status,
        Err(e) => {
            debug!("Status probe failed for {}: {e}", path.display());
            return missing(path);
        }
    };
    let branch = git.get_current_branch(&path).ok();

    RepoWorktreeState {
        name: repo.name.clone(),
        path,
        branch,
        clean: status.clean,
        uncommitted: status.uncommitted,
        exists: true,
    }
}
