//! Typed errors for etz
//!
//! Each variant maps to a distinct user-facing message and exit code so the
//! presentation layer can tell configuration problems apart from git failures
//! or rejected input. The library itself never exits the process.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, EtzError>;

#[derive(Error, Debug)]
pub enum EtzError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worktree not found: {0}")]
    WorktreeNotFound(String),

    #[error("git {operation} failed: {details}")]
    GitOperation { operation: String, details: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Build error: {0}")]
    Build(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

impl EtzError {
    /// Build a git operation error from a subcommand name and stderr
    pub fn git(operation: impl Into<String>, details: impl Into<String>) -> Self {
        Self::GitOperation {
            operation: operation.into(),
            details: details.into(),
        }
    }

    /// Process exit code the CLI should use for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            EtzError::ConfigNotFound(_) => 2,
            EtzError::InvalidConfig(_) | EtzError::Yaml(_) => 3,
            EtzError::WorktreeNotFound(_) => 4,
            EtzError::GitOperation { .. } => 5,
            EtzError::Validation(_) => 6,
            EtzError::Security(_) => 7,
            EtzError::Build(_) => 8,
            EtzError::Io(_) | EtzError::Other(_) => 1,
        }
    }
}
