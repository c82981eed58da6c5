//! Result types returned to the presentation layer

use serde::Serialize;
use std::fmt;

/// Outcome of creating one repository worktree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateStatus {
    AlreadyExists,
    AlreadyInUse,
    DryRun,
    CreatedNew,
    AddedLocal,
    AddedRemote,
    Error,
    Skipped,
}

/// Outcome of cleaning one repository worktree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanStatus {
    NotFound,
    NotWorktree,
    DryRun,
    Deleted,
    Error,
}

impl fmt::Display for CreateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreateStatus::AlreadyExists => "already_exists",
            CreateStatus::AlreadyInUse => "already_in_use",
            CreateStatus::DryRun => "dry_run",
            CreateStatus::CreatedNew => "created_new",
            CreateStatus::AddedLocal => "added_local",
            CreateStatus::AddedRemote => "added_remote",
            CreateStatus::Error => "error",
            CreateStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

impl fmt::Display for CleanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CleanStatus::NotFound => "not_found",
            CleanStatus::NotWorktree => "not_worktree",
            CleanStatus::DryRun => "dry_run",
            CleanStatus::Deleted => "deleted",
            CleanStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A step whose failure is reported but never fails the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepNote {
    pub step: String,
    pub ok: bool,
    pub detail: Option<String>,
}

impl StepNote {
    /// Record the outcome of a non-critical step, logging failures
    pub fn record<T, E: fmt::Display>(step: &str, result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(_) => Self {
                step: step.to_string(),
                ok: true,
                detail: None,
            },
            Err(e) => {
                tracing::warn!("non-critical step '{step}' failed: {e}");
                Self {
                    step: step.to_string(),
                    ok: false,
                    detail: Some(e.to_string()),
                }
            }
        }
    }
}

/// Per-repository result line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoResult<S> {
    pub repo_name: String,
    pub success: bool,
    pub message: String,
    pub status: S,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<StepNote>,
}

impl<S> RepoResult<S> {
    pub fn ok(repo_name: &str, status: S, message: impl Into<String>) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            success: true,
            message: message.into(),
            status,
            notes: Vec::new(),
        }
    }

    pub fn failed(repo_name: &str, status: S, message: impl Into<String>) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            success: false,
            message: message.into(),
            status,
            notes: Vec::new(),
        }
    }

    /// Attach non-critical step outcomes; failures are appended to the message
    pub fn with_notes(mut self, notes: Vec<StepNote>) -> Self {
        for note in notes.iter().filter(|n| !n.ok) {
            let detail = note.detail.as_deref().unwrap_or("unknown error");
            self.message
                .push_str(&format!(" (note: {} failed: {detail})", note.step));
        }
        self.notes = notes;
        self
    }
}

pub type CreateResult = RepoResult<CreateStatus>;
pub type CleanResult = RepoResult<CleanStatus>;

/// Overall success of a batch: every repository succeeded
pub fn all_succeeded<S>(results: &[RepoResult<S>]) -> bool {
    results.iter().all(|r| r.success)
}
