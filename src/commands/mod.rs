//! CLI command implementations
//!
//! Each command loads what it needs through [`Context`], calls one engine
//! operation and renders the result either as colored lines or as JSON.
//! Commands return whether every repository succeeded so the binary can
//! pick the exit code.

pub mod build;
pub mod clean;
pub mod detect;
pub mod new;
pub mod output;
pub mod status;

use std::path::Path;

use crate::build::BuildTracker;
use crate::config::{find_config, load_config, Config};
use crate::error::{EtzError, Result};
use crate::git::{check_git_available, SystemGit};
use crate::validation::{validate_branch_name, validate_repo_name};

/// Everything a command needs to run
pub struct Context {
    pub config: Config,
    pub git: SystemGit,
    pub builds: BuildTracker,
    pub json: bool,
}

impl Context {
    /// Locate and load the configuration and check that git is usable
    pub fn load(config_path: Option<&Path>, builds: BuildTracker, json: bool) -> Result<Self> {
        check_git_available()?;
        let path = find_config(config_path)?;
        let config = load_config(&path)?;
        Ok(Self {
            config,
            git: SystemGit,
            builds,
            json,
        })
    }
}

/// Parse `repo=branch` as used by `--repo-branch` and `--base`
pub fn parse_repo_branch(s: &str) -> std::result::Result<(String, String), String> {
    let (repo, branch) = s
        .split_once('=')
        .ok_or_else(|| format!("expected REPO=BRANCH, got '{s}'"))?;
    validate_repo_name(repo).map_err(|e| e.to_string())?;
    validate_branch_name(branch).map_err(|e| e.to_string())?;
    Ok((repo.to_string(), branch.to_string()))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| EtzError::Other(format!("failed to serialize output: {e}")))
}
