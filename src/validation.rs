//! Input validation shared by every entry point that accepts a label,
//! repository name or branch name from an external caller.
//!
//! Labels and repository names become directory segments under the worktree
//! root, so anything that could escape that root is rejected before any
//! filesystem or git call happens.

use std::path::{Component, Path, PathBuf};

use crate::error::{EtzError, Result};

/// Maximum allowed length for labels and repository names.
pub const MAX_NAME_LENGTH: usize = 128;

/// Characters that must never reach a git command line.
const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '`', '$', '(', ')', '<', '>'];

/// Validates that a label is safe to use as a directory under the worktree root.
///
/// A label is valid if:
/// - It is not empty and no longer than [`MAX_NAME_LENGTH`]
/// - It contains no `..`, `/` or `\`
/// - It is not an absolute path
/// - It does not start with `.` (dot directories are hidden from listings)
///
/// # Examples
///
/// ```
/// use etz::validation::validate_label;
///
/// assert!(validate_label("auth-feature").is_ok());
/// assert!(validate_label("").is_err());
/// assert!(validate_label("../etc").is_err());
/// ```
pub fn validate_label(label: &str) -> Result<()> {
    validate_path_segment("Label", label)
}

/// Validates a repository name from config or a `--repo` filter.
pub fn validate_repo_name(name: &str) -> Result<()> {
    validate_path_segment("Repository name", name)
}

fn validate_path_segment(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtzError::Validation(format!("{kind} cannot be empty")));
    }

    if value.len() > MAX_NAME_LENGTH {
        return Err(EtzError::Validation(format!(
            "{kind} too long: {} characters (max {MAX_NAME_LENGTH})",
            value.len()
        )));
    }

    if value.contains("..") || value.contains('/') || value.contains('\\') {
        return Err(EtzError::Validation(format!(
            "{kind} '{value}' must not contain '..', '/' or '\\'"
        )));
    }

    if Path::new(value).is_absolute() {
        return Err(EtzError::Validation(format!(
            "{kind} '{value}' must not be an absolute path"
        )));
    }

    if value.starts_with('.') {
        return Err(EtzError::Validation(format!(
            "{kind} '{value}' must not start with '.'"
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(EtzError::Validation(format!(
            "{kind} contains control characters"
        )));
    }

    Ok(())
}

/// Validates a branch name before it is passed to git.
///
/// Rejects empty names, names starting with `-` (they would be parsed as
/// options) and names containing shell metacharacters.
pub fn validate_branch_name(branch: &str) -> Result<()> {
    if branch.trim().is_empty() {
        return Err(EtzError::Validation("Branch name cannot be empty".into()));
    }

    if branch.starts_with('-') {
        return Err(EtzError::Validation(format!(
            "Branch name '{branch}' must not start with '-'"
        )));
    }

    if let Some(c) = branch.chars().find(|c| SHELL_METACHARACTERS.contains(c)) {
        return Err(EtzError::Validation(format!(
            "Branch name '{branch}' contains invalid character '{c}'"
        )));
    }

    if branch.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(EtzError::Validation(format!(
            "Branch name '{branch}' contains whitespace"
        )));
    }

    Ok(())
}

/// Verify that `target` resolves to a strict descendant of `root`.
///
/// Both paths are canonicalized when they exist so symlinks are followed;
/// otherwise they are normalized lexically. Returns the resolved target.
pub fn ensure_within_root(root: &Path, target: &Path) -> Result<PathBuf> {
    let root_resolved = resolve(root);
    let target_resolved = resolve(target);

    if target_resolved == root_resolved || !target_resolved.starts_with(&root_resolved) {
        return Err(EtzError::Security(format!(
            "Path {} resolves outside of worktree root {}",
            target.display(),
            root.display()
        )));
    }

    Ok(target_resolved)
}

fn resolve(path: &Path) -> PathBuf {
    path.canonicalize()
        .unwrap_or_else(|_| normalize_lexically(path))
}

/// Collapse `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Clap value parser for label arguments.
pub fn clap_label_validator(s: &str) -> std::result::Result<String, String> {
    validate_label(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

/// Clap value parser for branch arguments.
pub fn clap_branch_validator(s: &str) -> std::result::Result<String, String> {
    validate_branch_name(s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}
