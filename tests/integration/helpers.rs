//! Shared fixtures: bare origins with clones, a config file pointing at
//! them, and a [`GitOps`] wrapper that records mutating calls

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use etz::config::{load_config, Config};
use etz::git::{GitOps, RepoStatus, SystemGit, WorktreeInfo};
use etz::Result;

/// Run git in `dir`, panicking with stderr on failure
pub fn git(args: &[&str], dir: &Path) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create `<parent>/<name>.git` and a clone at `<parent>/<name>` with one
/// commit on `main` pushed and fetched
pub fn init_repo_with_origin(parent: &Path, name: &str) -> PathBuf {
    let origin = parent.join(format!("{name}.git"));
    let repo = parent.join(name);

    fs::create_dir_all(&origin).expect("Failed to create origin dir");
    git(&["init", "--bare"], &origin);

    fs::create_dir_all(&repo).expect("Failed to create repo dir");
    git(&["init"], &repo);
    git(&["config", "user.email", "test@test.com"], &repo);
    git(&["config", "user.name", "Test User"], &repo);
    git(&["config", "commit.gpgsign", "false"], &repo);
    fs::write(repo.join("README.md"), format!("# {name}\n")).expect("Failed to write README");
    git(&["add", "."], &repo);
    git(&["commit", "-m", "Initial commit"], &repo);
    git(&["branch", "-M", "main"], &repo);
    git(&["remote", "add", "origin", &origin.to_string_lossy()], &repo);
    git(&["push", "origin", "main"], &repo);
    git(&["fetch", "origin"], &repo);
    repo
}

/// Push a `develop` branch carrying `marker.txt` to the origin of `repo`
pub fn push_develop_with_marker(repo: &Path) {
    git(&["checkout", "-b", "develop"], repo);
    fs::write(repo.join("marker.txt"), "develop\n").expect("Failed to write marker");
    git(&["add", "marker.txt"], repo);
    git(&["commit", "-m", "Add marker"], repo);
    git(&["push", "origin", "develop"], repo);
    git(&["checkout", "main"], repo);
    git(&["branch", "-D", "develop"], repo);
    git(&["fetch", "origin"], repo);
}

/// A product made of several repositories, loaded through a real config file
pub struct Workspace {
    pub temp: TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new(names: &[&str]) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path();

        let mut yaml = format!(
            "base_branch: main\nworktree_root: {}\nrepositories:\n",
            root.join("worktrees").display()
        );
        for name in names {
            let repo = init_repo_with_origin(root, name);
            yaml.push_str(&format!(
                "  - name: {name}\n    base_path: {}\n",
                repo.display()
            ));
        }

        let config_path = root.join(".etz.yaml");
        fs::write(&config_path, yaml).expect("Failed to write config");
        let config = load_config(&config_path).expect("Failed to load config");

        Self { temp, config }
    }

    pub fn repo(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    pub fn worktree(&self, label: &str, name: &str) -> PathBuf {
        self.config.worktree_path(label, name)
    }
}

/// Operations that change repository state
const MUTATING: &[&str] = &[
    "add_worktree",
    "add_worktree_with_tracking",
    "remove_worktree",
    "prune_worktrees",
    "fetch_repo",
    "create_branch",
    "delete_local_branch",
    "unset_upstream",
];

/// [`GitOps`] that delegates to [`SystemGit`] and records each call
#[derive(Default)]
pub struct RecordingGit {
    inner: SystemGit,
    calls: RefCell<Vec<&'static str>>,
}

impl RecordingGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn mutating_calls(&self) -> Vec<&'static str> {
        self.calls()
            .into_iter()
            .filter(|c| MUTATING.contains(c))
            .collect()
    }

    fn record(&self, op: &'static str) {
        self.calls.borrow_mut().push(op);
    }
}

impl GitOps for RecordingGit {
    fn is_git_repo(&self, path: &Path) -> bool {
        self.record("is_git_repo");
        self.inner.is_git_repo(path)
    }

    fn get_status(&self, path: &Path) -> Result<RepoStatus> {
        self.record("get_status");
        self.inner.get_status(path)
    }

    fn get_current_branch(&self, path: &Path) -> Result<String> {
        self.record("get_current_branch");
        self.inner.get_current_branch(path)
    }

    fn list_branches(&self, path: &Path) -> Result<Vec<String>> {
        self.record("list_branches");
        self.inner.list_branches(path)
    }

    fn branch_exists_locally(&self, path: &Path, name: &str) -> bool {
        self.record("branch_exists_locally");
        self.inner.branch_exists_locally(path, name)
    }

    fn branch_exists_remotely(&self, path: &Path, name: &str) -> bool {
        self.record("branch_exists_remotely");
        self.inner.branch_exists_remotely(path, name)
    }

    fn list_worktrees(&self, path: &Path) -> Result<Vec<WorktreeInfo>> {
        self.record("list_worktrees");
        self.inner.list_worktrees(path)
    }

    fn add_worktree(
        &self,
        base_path: &Path,
        worktree_path: &Path,
        branch: &str,
        create_branch: bool,
    ) -> Result<()> {
        self.record("add_worktree");
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
        self.record("add_worktree_with_tracking");
        self.inner
            .add_worktree_with_tracking(base_path, worktree_path, local_branch, remote_ref)
    }

    fn remove_worktree(&self, base_path: &Path, worktree_path: &Path, force: bool) -> Result<()> {
        self.record("remove_worktree");
        self.inner.remove_worktree(base_path, worktree_path, force)
    }

    fn prune_worktrees(&self, base_path: &Path) -> Result<()> {
        self.record("prune_worktrees");
        self.inner.prune_worktrees(base_path)
    }

    fn fetch_repo(&self, base_path: &Path) -> Result<()> {
        self.record("fetch_repo");
        self.inner.fetch_repo(base_path)
    }

    fn create_branch(&self, base_path: &Path, name: &str, start_point: &str) -> Result<()> {
        self.record("create_branch");
        self.inner.create_branch(base_path, name, start_point)
    }

    fn delete_local_branch(&self, base_path: &Path, name: &str, force: bool) -> Result<()> {
        self.record("delete_local_branch");
        self.inner.delete_local_branch(base_path, name, force)
    }

    fn unset_upstream(&self, worktree_path: &Path) -> Result<()> {
        self.record("unset_upstream");
        self.inner.unset_upstream(worktree_path)
    }
}
