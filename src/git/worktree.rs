//! Git worktree operations
//!
//! Thin wrappers over `git worktree add/remove/list/prune`. None of these are
//! transactional; callers own any multi-step sequencing.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::runner::{run_git_bool, run_git_checked};
use crate::error::Result;

/// One record from `git worktree list --porcelain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub bare: bool,
}

/// Returns true if `path` is inside a git work tree. Never fails.
pub fn is_git_repo(path: &Path) -> bool {
    path.is_dir() && run_git_bool(&["rev-parse", "--is-inside-work-tree"], path)
}

/// List all worktrees of the repository at `repo_root`
pub fn list_worktrees(repo_root: &Path) -> Result<Vec<WorktreeInfo>> {
    let stdout = run_git_checked(&["worktree", "list", "--porcelain"], repo_root)?;
    Ok(parse_worktree_list(&stdout))
}

/// Parse `git worktree list --porcelain` output
///
/// Records are separated by blank lines; a record without a `worktree`
/// line is dropped.
///
/// Example input:
/// ```text
/// worktree /r/ios
/// HEAD abc123def456
/// branch refs/heads/main
///
/// worktree /wt/auth-feature/app-ios
/// HEAD def789abc012
/// branch refs/heads/auth-feature
/// ```
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = Vec::new();
    let mut path: Option<PathBuf> = None;
    let mut branch: Option<String> = None;
    let mut bare = false;

    let mut flush = |path: &mut Option<PathBuf>, branch: &mut Option<String>, bare: &mut bool| {
        if let Some(p) = path.take() {
            worktrees.push(WorktreeInfo {
                path: p,
                branch: branch.take(),
                bare: *bare,
            });
        }
        *branch = None;
        *bare = false;
    };

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            flush(&mut path, &mut branch, &mut bare);
        } else if let Some(p) = line.strip_prefix("worktree ") {
            path = Some(PathBuf::from(p));
        } else if let Some(b) = line.strip_prefix("branch ") {
            branch = Some(b.strip_prefix("refs/heads/").unwrap_or(b).to_string());
        } else if line == "bare" {
            bare = true;
        }
    }
    flush(&mut path, &mut branch, &mut bare);

    worktrees
}

/// `git worktree add [-b branch] <path> [branch]`
///
/// With `create_branch` the branch is created at HEAD; otherwise the
/// existing branch is checked out.
pub fn add_worktree(
    base_path: &Path,
    worktree_path: &Path,
    branch: &str,
    create_branch: bool,
) -> Result<()> {
    let path_str = worktree_path.to_string_lossy().into_owned();
    let mut args = vec!["worktree", "add"];
    if create_branch {
        args.extend(["-b", branch, path_str.as_str()]);
    } else {
        args.extend([path_str.as_str(), branch]);
    }
    run_git_checked(&args, base_path)?;
    Ok(())
}

/// `git worktree add --track -b <local> <path> <remote_ref>`
pub fn add_worktree_with_tracking(
    base_path: &Path,
    worktree_path: &Path,
    local_branch: &str,
    remote_ref: &str,
) -> Result<()> {
    let path_str = worktree_path.to_string_lossy().into_owned();
    run_git_checked(
        &[
            "worktree",
            "add",
            "--track",
            "-b",
            local_branch,
            path_str.as_str(),
            remote_ref,
        ],
        base_path,
    )?;
    Ok(())
}

/// `git worktree remove [--force] <path>`
pub fn remove_worktree(base_path: &Path, worktree_path: &Path, force: bool) -> Result<()> {
    let path_str = worktree_path.to_string_lossy().into_owned();
    let mut args = vec!["worktree", "remove"];
    if force {
        args.push("--force");
    }
    args.push(path_str.as_str());
    run_git_checked(&args, base_path)?;
    Ok(())
}

/// `git worktree prune`
pub fn prune_worktrees(base_path: &Path) -> Result<()> {
    run_git_checked(&["worktree", "prune"], base_path)?;
    Ok(())
}

/// Check that git is installed and supports worktrees (git 2.15+)
pub fn check_git_available() -> Result<()> {
    let cwd = std::env::current_dir()?;
    run_git_checked(&["--version"], &cwd)?;
    Ok(())
}
