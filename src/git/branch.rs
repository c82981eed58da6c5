//! Branch operations: query, create, delete, upstream handling

use std::path::Path;

use super::runner::{operation_name, run_git, run_git_bool, run_git_checked};
use crate::error::{EtzError, Result};

/// Remote every repository is expected to track
pub const REMOTE: &str = "origin";

/// Get the branch `HEAD` points at (`HEAD` when detached)
///
/// Resolves the symbolic ref, so an unborn branch still has a name.
pub fn current_branch(path: &Path) -> Result<String> {
    let args = ["symbolic-ref", "--quiet", "--short", "HEAD"];
    let output = run_git(&args, path)?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
    }
    // --quiet exits non-zero without a message only for a detached HEAD
    if output.stderr.is_empty() {
        return Ok("HEAD".to_string());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(EtzError::git(operation_name(&args), stderr))
}

/// List local and remote-tracking branches, sorted and deduplicated
pub fn list_branches(path: &Path) -> Result<Vec<String>> {
    let stdout = run_git_checked(&["branch", "-a", "--no-color"], path)?;
    Ok(parse_branch_list(&stdout))
}

/// Parse `git branch -a` output.
///
/// Strips the current/worktree markers and the `remotes/origin/` prefix and
/// drops every line naming the `HEAD` pseudo-ref.
pub(crate) fn parse_branch_list(output: &str) -> Vec<String> {
    let remote_prefix = format!("remotes/{REMOTE}/");
    let mut branches: Vec<String> = output
        .lines()
        .map(|line| line.trim_start_matches(['*', '+']).trim())
        .filter(|line| !line.is_empty() && !line.contains("HEAD"))
        .map(|line| {
            line.strip_prefix(&remote_prefix)
                .unwrap_or(line)
                .to_string()
        })
        .collect();
    branches.sort();
    branches.dedup();
    branches
}

/// Check `refs/heads/<name>`
pub fn branch_exists_locally(path: &Path, name: &str) -> bool {
    let ref_path = format!("refs/heads/{name}");
    run_git_bool(&["rev-parse", "--verify", "--quiet", &ref_path], path)
}

/// Ask the remote whether it has a head named `name`
pub fn branch_exists_remotely(path: &Path, name: &str) -> bool {
    match run_git(&["ls-remote", "--heads", REMOTE, name], path) {
        Ok(output) if output.status.success() => {
            !String::from_utf8_lossy(&output.stdout).trim().is_empty()
        }
        _ => false,
    }
}

/// Fetch from origin, pruning deleted remote branches
pub fn fetch_repo(path: &Path) -> Result<()> {
    run_git_checked(&["fetch", REMOTE, "--prune"], path)?;
    Ok(())
}

/// Create a branch at `start_point` without checking it out
pub fn create_branch(path: &Path, name: &str, start_point: &str) -> Result<()> {
    run_git_checked(&["branch", name, start_point], path)?;
    Ok(())
}

/// Delete a local branch; `force` uses `-D`, otherwise `-d` (merged only)
pub fn delete_local_branch(path: &Path, name: &str, force: bool) -> Result<()> {
    let flag = if force { "-D" } else { "-d" };
    run_git_checked(&["branch", flag, name], path)?;
    Ok(())
}

/// Remove the upstream of the branch checked out at `worktree_path`
pub fn unset_upstream(worktree_path: &Path) -> Result<()> {
    run_git_checked(&["branch", "--unset-upstream"], worktree_path)?;
    Ok(())
}
