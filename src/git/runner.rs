//! Git command runner
//!
//! Centralizes spawning `git` so every call gets the same logging and the same
//! translation of failures into [`EtzError::GitOperation`].

use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

use crate::error::{EtzError, Result};

/// Subcommands whose first argument is itself a subcommand
const NESTED_SUBCOMMANDS: &[&str] = &["worktree", "remote"];

/// Human-readable operation name for error reporting (`worktree add`, `fetch`, ...)
pub(crate) fn operation_name(args: &[&str]) -> String {
    match args {
        [first, second, ..] if NESTED_SUBCOMMANDS.contains(first) => format!("{first} {second}"),
        [first, ..] => (*first).to_string(),
        [] => "git".to_string(),
    }
}

/// Run a git command and return the raw Output.
///
/// Only spawn failures are errors here; a non-zero exit is left to the caller.
pub fn run_git(args: &[&str], repo_root: &Path) -> Result<Output> {
    debug!("git {} (in {})", args.join(" "), repo_root.display());
    Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .map_err(|e| EtzError::git(operation_name(args), format!("failed to execute: {e}")))
}

/// Run a git command, check for success, and return stdout trimmed.
///
/// On failure, returns a `GitOperation` error carrying stderr.
pub fn run_git_checked(args: &[&str], repo_root: &Path) -> Result<String> {
    let output = run_git(args, repo_root)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let details = if stderr.is_empty() {
            format!("exit status {}", output.status)
        } else {
            stderr
        };
        return Err(EtzError::git(operation_name(args), details));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a git command and return true if exit code is 0.
///
/// Swallows spawn failures and non-zero exits alike.
pub fn run_git_bool(args: &[&str], repo_root: &Path) -> bool {
    run_git(args, repo_root)
        .map(|output| output.status.success())
        .unwrap_or(false)
}
