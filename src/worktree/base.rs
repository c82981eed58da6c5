//! Base branch resolution for new feature branches
//!
//! Precedence: per-repository override, then the configured `base_branch`,
//! then [`FALLBACK_BASE_BRANCH`].

use std::collections::HashMap;

use crate::config::{Config, FALLBACK_BASE_BRANCH};
use crate::error::Result;
use crate::validation::validate_branch_name;

/// Where a resolved base branch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSource {
    Override,
    Config,
    Fallback,
}

/// Result of resolving the base branch for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBase {
    pub branch: String,
    pub source: BaseSource,
}

impl ResolvedBase {
    /// Remote-tracking start point for a brand-new branch (`origin/<base>`)
    pub fn start_point(&self) -> String {
        format!("{}/{}", crate::git::REMOTE, self.branch)
    }
}

/// Resolve and validate the base branch for `repo_name`
pub fn resolve_base_branch(
    repo_name: &str,
    overrides: &HashMap<String, String>,
    config: &Config,
) -> Result<ResolvedBase> {
    let (branch, source) = match (overrides.get(repo_name), &config.base_branch) {
        (Some(branch), _) => (branch.as_str(), BaseSource::Override),
        (None, Some(branch)) => (branch.as_str(), BaseSource::Config),
        (None, None) => (FALLBACK_BASE_BRANCH, BaseSource::Fallback),
    };

    validate_branch_name(branch)?;

    Ok(ResolvedBase {
        branch: branch.to_string(),
        source,
    })
}
