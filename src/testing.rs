//! Shared fixtures for unit tests: throwaway git repositories with an origin
//! and a recording [`GitOps`] implementation

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{Config, RepositoryConfig};
use crate::error::{EtzError, Result};
use crate::git::{GitOps, RepoStatus, SystemGit, WorktreeInfo};

/// Run git in `dir` and panic with stderr on failure
pub(crate) fn git(args: &[&str], dir: &Path) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a repository at `dir` with one commit on `main`
pub(crate) fn init_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    git(&["init"], dir);
    git(&["config", "user.email", "test@test.com"], dir);
    git(&["config", "user.name", "Test"], dir);
    git(&["config", "commit.gpgsign", "false"], dir);
    fs::write(dir.join("README.md"), "# Test").unwrap();
    git(&["add", "."], dir);
    git(&["commit", "-m", "Initial commit"], dir);
    git(&["branch", "-M", "main"], dir);
}

/// Create `<parent>/<name>.git` (bare origin) and `<parent>/<name>` (clone
/// with `origin/main` fetched). Returns the clone path.
pub(crate) fn init_repo_with_origin(parent: &Path, name: &str) -> PathBuf {
    let origin = parent.join(format!("{name}.git"));
    let repo = parent.join(name);

    fs::create_dir_all(&origin).unwrap();
    git(&["init", "--bare"], &origin);

    init_repo(&repo);
    git(&["remote", "add", "origin", &origin.to_string_lossy()], &repo);
    git(&["push", "origin", "main"], &repo);
    git(&["fetch", "origin"], &repo);
    repo
}

/// [`GitOps`] wrapper that records every call and can be told to fail
/// selected operations
#[derive(Default)]
pub(crate) struct SpyGit {
    inner: SystemGit,
    calls: RefCell<Vec<String>>,
    failing: Vec<&'static str>,
}

impl SpyGit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(ops: &[&'static str]) -> Self {
        Self {
            failing: ops.to_vec(),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub(crate) fn called(&self, op: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == op)
    }

    fn enter(&self, op: &'static str) -> Result<()> {
        self.calls.borrow_mut().push(op.to_string());
        if self.failing.contains(&op) {
            return Err(EtzError::git(op, "injected failure"));
        }
        Ok(())
    }
}

impl GitOps for SpyGit {
    fn is_git_repo(&self, path: &Path) -> bool {
        self.enter("is_git_repo").is_ok() && self.inner.is_git_repo(path)
    }

    fn get_status(&self, path: &Path) -> Result<RepoStatus> {
        self.enter("get_status")?;
        self.inner.get_status(path)
    }

    fn get_current_branch(&self, path: &Path) -> Result<String> {
        self.enter("get_current_branch")?;
        self.inner.get_current_branch(path)
    }

    fn list_branches(&self, path: &Path) -> Result<Vec<String>> {
        self.enter("list_branches")?;
        self.inner.list_branches(path)
    }

    fn branch_exists_locally(&self, path: &Path, name: &str) -> bool {
        self.enter("branch_exists_locally").is_ok() && self.inner.branch_exists_locally(path, name)
    }

    fn branch_exists_remotely(&self, path: &Path, name: &str) -> bool {
        self.enter("branch_exists_remotely").is_ok()
            && self.inner.branch_exists_remotely(path, name)
    }

    fn list_worktrees(&self, path: &Path) -> Result<Vec<WorktreeInfo>> {
        self.enter("list_worktrees")?;
        self.inner.list_worktrees(path)
    }

    fn add_worktree(
        &self,
        base_path: &Path,
        worktree_path: &Path,
        branch: &str,
        create_branch: bool,
    ) -> Result<()> {
        self.enter("add_worktree")?;
        self.inner
            .add_worktree(base_path, worktree_path, branch, create_branch)
    }

    fn add_worktree_with_tracking(
        &self,
        base_path: &Path,
        worktree_path: &Path,
        local_branch: &str,
        remote_ref: &str,
    ) -> Result<()> {
        self.enter("add_worktree_with_tracking")?;
        self.inner
            .add_worktree_with_tracking(base_path, worktree_path, local_branch, remote_ref)
    }

    fn remove_worktree(&self, base_path: &Path, worktree_path: &Path, force: bool) -> Result<()> {
        self.enter("remove_worktree")?;
        self.inner.remove_worktree(base_path, worktree_path, force)
    }

    fn prune_worktrees(&self, base_path: &Path) -> Result<()> {
        self.enter("prune_worktrees")?;
        self.inner.prune_worktrees(base_path)
    }

    fn fetch_repo(&self, base_path: &Path) -> Result<()> {
        self.enter("fetch_repo")?;
        self.inner.fetch_repo(base_path)
    }

    fn create_branch(&self, base_path: &Path, name: &str, start_point: &str) -> Result<()> {
        self.enter("create_branch")?;
        self.inner.create_branch(base_path, name, start_point)
    }

    fn delete_local_branch(&self, base_path: &Path, name: &str, force: bool) -> Result<()> {
        self.enter("delete_local_branch")?;
        self.inner.delete_local_branch(base_path, name, force)
    }

    fn unset_upstream(&self, worktree_path: &Path) -> Result<()> {
        self.enter("unset_upstream")?;
        self.inner.unset_upstream(worktree_path)
    }
}

/// Config with one repository per name, each cloned from a bare origin
/// under `temp`, and the worktree root at `temp/worktrees`
pub(crate) fn config_with_repos(temp: &Path, names: &[&str]) -> Config {
    let repos = names
        .iter()
        .map(|name| RepositoryConfig {
            name: name.to_string(),
            base_path: init_repo_with_origin(temp, name),
        })
        .collect();
    Config::new(Some("main"), temp.join("worktrees"), repos).unwrap()
}
