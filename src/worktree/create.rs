//! Worktree group creation
//!
//! For every configured repository, decides whether the requested branch
//! needs a new branch, an existing local branch, a remote-tracking branch,
//! or is a conflict, then runs the matching git calls. Repositories are
//! processed sequentially in configured order and fail independently.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::base::{resolve_base_branch, ResolvedBase};
use crate::config::{Config, RepositoryConfig};
use crate::error::Result;
use crate::git::GitOps;
use crate::models::{CreateResult, CreateStatus, StepNote};
use crate::validation::{validate_branch_name, validate_label};

/// Parameters for [`create_worktree_group`]
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub label: String,
    /// Branch used for repositories without an override
    pub default_branch: Option<String>,
    /// Per-repository branch overrides
    pub branch_overrides: HashMap<String, String>,
    /// Per-repository base branch overrides
    pub base_branch_overrides: HashMap<String, String>,
    /// Restrict to one repository
    pub repo_filter: Option<String>,
    pub dry_run: bool,
}

impl CreateRequest {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = Some(branch.into());
        self
    }

    pub fn branch_for(mut self, repo: impl Into<String>, branch: impl Into<String>) -> Self {
        self.branch_overrides.insert(repo.into(), branch.into());
        self
    }

    pub fn base_for(mut self, repo: impl Into<String>, base: impl Into<String>) -> Self {
        self.base_branch_overrides.insert(repo.into(), base.into());
        self
    }

    pub fn only_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo_filter = Some(repo.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn branch_for_repo(&self, repo_name: &str) -> Option<&str> {
        self.branch_overrides
            .get(repo_name)
            .or(self.default_branch.as_ref())
            .map(String::as_str)
    }
}

/// How a worktree will be attached to its branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateAction {
    /// Branch exists nowhere: create it from `origin/<base>`
    NewBranch,
    /// Branch exists locally
    ExistingLocal,
    /// Branch exists only on the remote
    TrackRemote,
}

impl CreateAction {
    pub fn plan(exists_locally: bool, exists_remotely: bool) -> Self {
        match (exists_locally, exists_remotely) {
            (true, _) => CreateAction::ExistingLocal,
            (false, true) => CreateAction::TrackRemote,
            (false, false) => CreateAction::NewBranch,
        }
    }

    fn describe(self, branch: &str, base: &ResolvedBase, path: &Path) -> String {
        match self {
            CreateAction::NewBranch => format!(
                "Would create new branch '{branch}' from {} at {}",
                base.start_point(),
                path.display()
            ),
            CreateAction::ExistingLocal => format!(
                "Would add worktree for existing local branch '{branch}' at {}",
                path.display()
            ),
            CreateAction::TrackRemote => format!(
                "Would add worktree tracking {}/{branch} at {}",
                crate::git::REMOTE,
                path.display()
            ),
        }
    }
}

/// Create worktrees for a label across the configured repositories.
///
/// An invalid label or unknown repository filter fails the whole call before
/// any filesystem or git access. Everything else is reported per repository.
pub fn create_worktree_group<G: GitOps + ?Sized>(
    config: &Config,
    git: &G,
    request: &CreateRequest,
) -> Result<Vec<CreateResult>> {
    validate_label(&request.label)?;
    let repos = config.select_repositories(request.repo_filter.as_deref())?;

    info!(
        "Creating worktree group '{}' across {} repositories{}",
        request.label,
        repos.len(),
        if request.dry_run { " (dry run)" } else { "" }
    );

    let results = repos
        .into_iter()
        .map(|repo| {
            let result = create_for_repo(config, git, request, repo);
            info!("{}: {} - {}", result.repo_name, result.status, result.message);
            result
        })
        .collect();

    Ok(results)
}

fn create_for_repo<G: GitOps + ?Sized>(
    config: &Config,
    git: &G,
    request: &CreateRequest,
    repo: &RepositoryConfig,
) -> CreateResult {
    let name = repo.name.as_str();

    let Some(branch) = request.branch_for_repo(name) else {
        return CreateResult::ok(name, CreateStatus::Skipped, "No branch specified");
    };

    if let Err(e) = validate_branch_name(branch) {
        return CreateResult::failed(name, CreateStatus::Error, e.to_string());
    }

    let worktree_path = config.worktree_path(&request.label, name);

    if worktree_path.exists() {
        return CreateResult::ok(
            name,
            CreateStatus::AlreadyExists,
            format!("Worktree already exists at {}", worktree_path.display()),
        );
    }

    match find_worktree_for_branch(git, &repo.base_path, branch) {
        Ok(Some(existing)) => {
            return CreateResult::failed(
                name,
                CreateStatus::AlreadyInUse,
                format!(
                    "Branch '{branch}' is already checked out at {}",
                    existing.display()
                ),
            );
        }
        Ok(None) => {}
        Err(e) => return CreateResult::failed(name, CreateStatus::Error, e.to_string()),
    }

    let base = match resolve_base_branch(name, &request.base_branch_overrides, config) {
        Ok(base) => base,
        Err(e) => return CreateResult::failed(name, CreateStatus::Error, e.to_string()),
    };

    if request.dry_run {
        let local = git.branch_exists_locally(&repo.base_path, branch);
        let remote = !local && git.branch_exists_remotely(&repo.base_path, branch);
        let action = CreateAction::plan(local, remote);
        return CreateResult::ok(
            name,
            CreateStatus::DryRun,
            action.describe(branch, &base, &worktree_path),
        );
    }

    match attach_worktree(git, &repo.base_path, branch, &base, &worktree_path) {
        Ok((status, message, notes)) => CreateResult::ok(name, status, message).with_notes(notes),
        Err(e) => CreateResult::failed(name, CreateStatus::Error, e.to_string()),
    }
}

/// Path of the worktree that has `branch` checked out, if any
fn find_worktree_for_branch<G: GitOps + ?Sized>(
    git: &G,
    base_path: &Path,
    branch: &str,
) -> Result<Option<PathBuf>> {
    let worktrees = git.list_worktrees(base_path)?;
    Ok(worktrees
        .into_iter()
        .find(|w| w.branch.as_deref() == Some(branch))
        .map(|w| w.path))
}

fn attach_worktree<G: GitOps + ?Sized>(
    git: &G,
    base_path: &Path,
    branch: &str,
    base: &ResolvedBase,
    worktree_path: &Path,
) -> Result<(CreateStatus, String, Vec<StepNote>)> {
    if let Some(parent) = worktree_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut notes = vec![StepNote::record("fetch", git.fetch_repo(base_path))];

    let local = git.branch_exists_locally(base_path, branch);
    let remote = !local && git.branch_exists_remotely(base_path, branch);

    match CreateAction::plan(local, remote) {
        CreateAction::NewBranch => {
            let start_point = base.start_point();
            git.create_branch(base_path, branch, &start_point)?;

            if let Err(e) = git.add_worktree(base_path, worktree_path, branch, false) {
                // Leave no half-created branch behind so a retry starts clean
                if let Err(rollback) = git.delete_local_branch(base_path, branch, true) {
                    warn!("Failed to roll back branch '{branch}': {rollback}");
                }
                return Err(e);
            }

            notes.push(StepNote::record(
                "unset upstream",
                git.unset_upstream(worktree_path),
            ));
            Ok((
                CreateStatus::CreatedNew,
                format!("Created new branch '{branch}' from {start_point}"),
                notes,
            ))
        }
        CreateAction::ExistingLocal => {
            git.add_worktree(base_path, worktree_path, branch, false)?;
            notes.push(StepNote::record(
                "unset upstream",
                git.unset_upstream(worktree_path),
            ));
            Ok((
                CreateStatus::AddedLocal,
                format!("Added worktree for existing local branch '{branch}'"),
                notes,
            ))
        }
        CreateAction::TrackRemote => {
            let remote_ref = format!("{}/{branch}", crate::git::REMOTE);
            git.add_worktree_with_tracking(base_path, worktree_path, branch, &remote_ref)?;
            Ok((
                CreateStatus::AddedRemote,
                format!("Added worktree tracking {remote_ref}"),
                notes,
            ))
        }
    }
}
