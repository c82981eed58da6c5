//! Configuration loading for etz
//!
//! The configuration names the worktree root, the repositories that make up
//! one product and the base branch new feature branches start from. It is
//! read once per run and treated as immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{EtzError, Result};
use crate::validation::{validate_branch_name, validate_repo_name};

/// Environment variable that points at a config file
pub const CONFIG_ENV_VAR: &str = "ETZ_CONFIG";

/// Config file name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = ".etz.yaml";

/// Base branch used when neither a per-repo override nor the config names one
pub const FALLBACK_BASE_BRANCH: &str = "master";

/// One repository participating in worktree groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Unique name, also the directory segment under each label
    pub name: String,
    /// Path to the primary clone
    pub base_path: PathBuf,
}

/// Build tool settings. Every field has a default so the section is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Gradle task in the infra repository producing the iOS framework
    pub infra_ios_task: String,
    /// Directory (relative to the infra repository) holding published Android artifacts
    pub infra_android_artifacts: PathBuf,
    /// Gradle task building the Android app
    pub android_task: String,
    /// Xcode scheme; derived from the workspace name when unset
    pub ios_scheme: Option<String>,
    pub ios_configuration: String,
    /// Export options plist (relative to the iOS repository)
    pub export_options_plist: PathBuf,
    /// Xcode derived data root; defaults to ~/Library/Developer/Xcode/DerivedData
    pub derived_data_path: Option<PathBuf>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            infra_ios_task: "assembleXCFramework".to_string(),
            infra_android_artifacts: PathBuf::from("build/repo"),
            android_task: "assembleDebug".to_string(),
            ios_scheme: None,
            ios_configuration: "Debug".to_string(),
            export_options_plist: PathBuf::from("ExportOptions.plist"),
            derived_data_path: None,
        }
    }
}

impl BuildSettings {
    /// Resolved derived data root, if a home directory is known
    pub fn derived_data_root(&self) -> Option<PathBuf> {
        self.derived_data_path.clone().or_else(|| {
            dirs::home_dir().map(|home| {
                home.join("Library")
                    .join("Developer")
                    .join("Xcode")
                    .join("DerivedData")
            })
        })
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub base_branch: Option<String>,
    pub worktree_root: PathBuf,
    pub repositories: Vec<RepositoryConfig>,
    #[serde(default)]
    pub build: BuildSettings,
}

impl Config {
    /// Create a config programmatically and validate it
    pub fn new(
        base_branch: Option<&str>,
        worktree_root: impl Into<PathBuf>,
        repositories: Vec<RepositoryConfig>,
    ) -> Result<Self> {
        let config = Self {
            base_branch: base_branch.map(String::from),
            worktree_root: worktree_root.into(),
            repositories,
            build: BuildSettings::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse config from YAML text, expanding `~` and validating invariants
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(content)
            .map_err(|e| EtzError::InvalidConfig(format!("failed to parse YAML: {e}")))?;
        config.expand_home();
        config.validate()?;
        Ok(config)
    }

    /// Look up a repository by name
    pub fn repository(&self, name: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.name == name)
    }

    /// Repositories to operate on, in configured order.
    ///
    /// With a filter, only the named repository is returned; an unknown name
    /// is a validation error.
    pub fn select_repositories(&self, filter: Option<&str>) -> Result<Vec<&RepositoryConfig>> {
        match filter {
            None => Ok(self.repositories.iter().collect()),
            Some(name) => {
                validate_repo_name(name)?;
                self.repository(name).map(|r| vec![r]).ok_or_else(|| {
                    EtzError::Validation(format!("Unknown repository '{name}'"))
                })
            }
        }
    }

    /// Directory holding every repository worktree for a label
    pub fn label_dir(&self, label: &str) -> PathBuf {
        self.worktree_root.join(label)
    }

    /// Worktree path for one repository under a label
    pub fn worktree_path(&self, label: &str, repo_name: &str) -> PathBuf {
        self.label_dir(label).join(repo_name)
    }

    fn expand_home(&mut self) {
        self.worktree_root = expand_tilde(&self.worktree_root);
        for repo in &mut self.repositories {
            repo.base_path = expand_tilde(&repo.base_path);
        }
        if let Some(path) = self.build.derived_data_path.take() {
            self.build.derived_data_path = Some(expand_tilde(&path));
        }
    }

    /// Check config invariants
    pub fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            return Err(EtzError::InvalidConfig(
                "at least one repository must be configured".into(),
            ));
        }

        if !self.worktree_root.is_absolute() {
            return Err(EtzError::InvalidConfig(format!(
                "worktree_root must be an absolute path: {}",
                self.worktree_root.display()
            )));
        }

        if let Some(base) = &self.base_branch {
            validate_branch_name(base)
                .map_err(|e| EtzError::InvalidConfig(format!("base_branch: {e}")))?;
        }

        let mut seen = HashSet::new();
        for repo in &self.repositories {
            validate_repo_name(&repo.name)
                .map_err(|e| EtzError::InvalidConfig(e.to_string()))?;

            if !seen.insert(repo.name.as_str()) {
                return Err(EtzError::InvalidConfig(format!(
                    "duplicate repository name '{}'",
                    repo.name
                )));
            }

            if !repo.base_path.is_absolute() {
                return Err(EtzError::InvalidConfig(format!(
                    "base_path for '{}' must be absolute: {}",
                    repo.name,
                    repo.base_path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Load and validate a config file
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(EtzError::ConfigNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let config = Config::from_yaml(&content)?;
    tracing::debug!(
        "Loaded config from {} ({} repositories)",
        path.display(),
        config.repositories.len()
    );
    Ok(config)
}

/// Find the config file to use.
///
/// Order: explicit path, `$ETZ_CONFIG`, `./.etz.yaml`, `~/.etz/config.yaml`.
/// Returns the first candidate that exists, or `ConfigNotFound` naming the
/// last location tried.
pub fn find_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(EtzError::ConfigNotFound(path.to_path_buf()))
        };
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        let path = expand_tilde(Path::new(&env_path));
        return if path.exists() {
            Ok(path)
        } else {
            Err(EtzError::ConfigNotFound(path))
        };
    }

    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(LOCAL_CONFIG_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".etz").join("config.yaml"));
    }

    let last = candidates
        .last()
        .cloned()
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

    candidates
        .into_iter()
        .find(|p| p.exists())
        .ok_or(EtzError::ConfigNotFound(last))
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
