//! Git operations for etz worktree management
//!
//! This module provides:
//! - A command runner translating git failures into typed errors
//! - Branch, status and worktree wrappers over the git CLI
//! - The [`GitOps`] trait the engines are written against, so tests can
//!   substitute a recording implementation for [`SystemGit`]

pub mod branch;
pub mod runner;
pub mod status;
pub mod worktree;

use std::path::Path;

use crate::error::Result;

pub use branch::REMOTE;
pub use status::RepoStatus;
pub use worktree::{check_git_available, parse_worktree_list, WorktreeInfo};

/// Every git interaction the engines need
pub trait GitOps {
    /// Never fails; false on any error
    fn is_git_repo(&self, path: &Path) -> bool;
    fn get_status(&self, path: &Path) -> Result<RepoStatus>;
    fn get_current_branch(&self, path: &Path) -> Result<String>;
    fn list_branches(&self, path: &Path) -> Result<Vec<String>>;
    /// Errors are reported as `false`
    fn branch_exists_locally(&self, path: &Path, name: &str) -> bool;
    /// Errors are reported as `false`
    fn branch_exists_remotely(&self, path: &Path, name: &str) -> bool;
    fn list_worktrees(&self, path: &Path) -> Result<Vec<WorktreeInfo>>;
    fn add_worktree(
        &self,
        base_path: &Path,
        worktree_path: &Path,
        branch: &str,
        create_branch: bool,
    ) -> Result<()>;
    fn add_worktree_with_tracking(
        &self,
        base_path: &Path,
        worktree_path: &Path,
        local_branch: &str,
        remote_ref: &str,
    ) -> Result<()>;
    fn remove_worktree(&self, base_path: &Path, worktree_path: &Path, force: bool) -> Result<()>;
    fn prune_worktrees(&self, base_path: &Path) -> Result<()>;
    fn fetch_repo(&self, base_path: &Path) -> Result<()>;
    fn create_branch(&self, base_path: &Path, name: &str, start_point: &str) -> Result<()>;
    fn delete_local_branch(&self, base_path: &Path, name: &str, force: bool) -> Result<()>;
    fn unset_upstream(&self, worktree_path: &Path) -> Result<()>;
}

/// [`GitOps`] backed by the installed `git` binary
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl GitOps for SystemGit {
    fn is_git_repo(&self, path: &Path) -> bool {
        worktree::is_git_repo(path)
    }

    fn get_status(&self, path: &Path) -> Result<RepoStatus> {
        status::get_status(path)
    }

    fn get_current_branch(&self, path: &Path) -> Result<String> {
        branch::current_branch(path)
    }

    fn list_branches(&self, path: &Path) -> Result<Vec<String>> {
        branch::list_branches(path)
    }

    fn branch_exists_locally(&self, path: &Path, name: &str) -> bool {
        branch::branch_exists_locally(path, name)
    }

    fn branch_exists_remotely(&self, path: &Path, name: &str) -> bool {
        branch::branch_exists_remotely(path, name)
    }

    fn list_worktrees(&self, path: &Path) -> Result<Vec<WorktreeInfo>> {
        worktree::list_worktrees(path)
    }

    fn add_worktree(
        &self,
        base_path: &Path,
        worktree_path: &Path,
        branch: &str,
        create_branch: bool,
    ) -> Result<()> {
        worktree::add_worktree(base_path, worktree_path, branch, create_branch)
    }

    fn add_worktree_with_tracking(
        &self,
        base_path: &Path,
        worktree_path: &Path,
        local_branch: &str,
        remote_ref: &str,
    ) -> Result<()> {
        worktree::add_worktree_with_tracking(base_path, worktree_path, local_branch, remote_ref)
    }

    fn remove_worktree(&self, base_path: &Path, worktree_path: &Path, force: bool) -> Result<()> {
        worktree::remove_worktree(base_path, worktree_path, force)
    }

    fn prune_worktrees(&self, base_path: &Path) -> Result<()> {
        worktree::prune_worktrees(base_path)
    }

    fn fetch_repo(&self, base_path: &Path) -> Result<()> {
        branch::fetch_repo(base_path)
    }

    fn create_branch(&self, base_path: &Path, name: &str, start_point: &str) -> Result<()> {
        branch::create_branch(base_path, name, start_point)
    }

    fn delete_local_branch(&self, base_path: &Path, name: &str, force: bool) -> Result<()> {
        branch::delete_local_branch(base_path, name, force)
    }

    fn unset_upstream(&self, worktree_path: &Path) -> Result<()> {
        branch::unset_upstream(worktree_path)
    }
}
