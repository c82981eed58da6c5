//! Worktree group removal

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::derived_data::{find_derived_data, remove_derived_data};
use crate::build::BuildTracker;
use crate::config::{Config, RepositoryConfig};
use crate::error::{EtzError, Result};
use crate::git::GitOps;
use crate::models::{CleanResult, CleanStatus, StepNote};
use crate::validation::{ensure_within_root, validate_label};

/// Parameters for [`clean_worktree_group`]
#[derive(Debug, Clone, Default)]
pub struct CleanRequest {
    pub label: String,
    /// Restrict to one repository
    pub repo_filter: Option<String>,
    /// Remove even with uncommitted changes or a broken worktree
    pub force: bool,
    /// Delete the local branch each worktree had checked out
    pub delete_branches: bool,
    pub dry_run: bool,
}

impl CleanRequest {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn only_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo_filter = Some(repo.into());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn delete_branches(mut self, delete: bool) -> Self {
        self.delete_branches = delete;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Remove the worktrees of a label.
///
/// Returns `Err` only when the label is invalid, the repository filter is
/// unknown, or the label directory resolves outside the worktree root. All
/// per-repository failures are reported in the returned list.
pub fn clean_worktree_group<G: GitOps + ?Sized>(
    config: &Config,
    git: &G,
    builds: &BuildTracker,
    request: &CleanRequest,
) -> Result<Vec<CleanResult>> {
    validate_label(&request.label)?;
    let repos = config.select_repositories(request.repo_filter.as_deref())?;

    let label_dir = config.label_dir(&request.label);
    if label_dir.exists() || label_dir.is_symlink() {
        ensure_within_root(&config.worktree_root, &label_dir)?;
    }

    if !request.dry_run {
        let killed = builds.kill_all_builds_for_label(&request.label);
        if killed > 0 {
            info!("Killed {killed} active build(s) for '{}'", request.label);
        }
    }

    let derived_root = config.build.derived_data_root();
    let mut results: Vec<CleanResult> = repos
        .into_iter()
        .map(|repo| {
            let result = clean_repo(config, git, request, repo, derived_root.as_deref());
            info!("{}: {} - {}", result.repo_name, result.status, result.message);
            result
        })
        .collect();

    if !request.dry_run {
        if let Some(result) = remove_empty_label_dir(&label_dir, &request.label) {
            results.push(result);
        }
    }

    Ok(results)
}

fn clean_repo<G: GitOps + ?Sized>(
    config: &Config,
    git: &G,
    request: &CleanRequest,
    repo: &RepositoryConfig,
    derived_root: Option<&Path>,
) -> CleanResult {
    let name = repo.name.as_str();
    let worktree_path = config.worktree_path(&request.label, name);

    if !worktree_path.exists() {
        return CleanResult::ok(
            name,
            CleanStatus::NotFound,
            format!("No worktree at {}", worktree_path.display()),
        );
    }

    let is_worktree = worktree_path.join(".git").exists();
    if !is_worktree && !request.force {
        return CleanResult::failed(
            name,
            CleanStatus::NotWorktree,
            format!(
                "{} is not a git worktree (use --force to delete anyway)",
                worktree_path.display()
            ),
        );
    }

    if request.dry_run {
        let caches: Vec<PathBuf> = derived_root
            .map(|root| find_derived_data(&worktree_path, root))
            .unwrap_or_default();
        let mut message = format!("Would remove {}", worktree_path.display());
        for cache in &caches {
            message.push_str(&format!(", {}", cache.display()));
        }
        return CleanResult::ok(name, CleanStatus::DryRun, message);
    }

    match remove_repo_worktree(git, request, repo, &worktree_path, is_worktree, derived_root) {
        Ok(notes) => CleanResult::ok(
            name,
            CleanStatus::Deleted,
            format!("Removed {}", worktree_path.display()),
        )
        .with_notes(notes),
        Err(e) => CleanResult::failed(name, CleanStatus::Error, e.to_string()),
    }
}

fn remove_repo_worktree<G: GitOps + ?Sized>(
    git: &G,
    request: &CleanRequest,
    repo: &RepositoryConfig,
    worktree_path: &Path,
    is_worktree: bool,
    derived_root: Option<&Path>,
) -> Result<Vec<StepNote>> {
    let mut notes = Vec::new();

    // Project files are gone once the worktree is removed
    let caches = derived_root
        .map(|root| find_derived_data(worktree_path, root))
        .unwrap_or_default();

    let branch = if request.delete_branches && is_worktree {
        match git.get_current_branch(worktree_path) {
            Ok(branch) if branch != "HEAD" => Some(branch),
            Ok(_) => None,
            Err(e) => {
                notes.push(StepNote::record::<(), _>("read branch", Err(e)));
                None
            }
        }
    } else {
        None
    };

    if let Err(e) = git.remove_worktree(&repo.base_path, worktree_path, request.force) {
        if !request.force {
            return Err(e);
        }
        warn!("git worktree remove failed for {}, forcing: {e}", repo.name);
        notes.push(StepNote::record::<(), _>("worktree remove", Err(e)));
        notes.push(StepNote::record("prune", git.prune_worktrees(&repo.base_path)));
    }

    for removed in remove_derived_data(caches) {
        info!("Removed derived data {}", removed.display());
    }

    if worktree_path.exists() {
        fs::remove_dir_all(worktree_path)?;
    }

    if let Some(branch) = branch {
        notes.push(StepNote::record(
            "delete branch",
            git.delete_local_branch(&repo.base_path, &branch, true),
        ));
    }

    Ok(notes)
}

/// Remove the label folder once nothing but dotfiles remain in it
fn remove_empty_label_dir(label_dir: &Path, label: &str) -> Option<CleanResult> {
    let entries = fs::read_dir(label_dir).ok()?;
    let has_content = entries
        .flatten()
        .any(|e| !e.file_name().to_string_lossy().starts_with('.'));
    if has_content {
        return None;
    }

    let display = format!("{label}/");
    Some(match fs::remove_dir_all(label_dir) {
        Ok(()) => CleanResult::ok(
            &display,
            CleanStatus::Deleted,
            format!("Removed empty label folder {}", label_dir.display()),
        ),
        Err(e) => CleanResult::failed(
            &display,
            CleanStatus::Error,
            EtzError::from(e).to_string(),
        ),
    })
}
