//! Read-only build readiness checks
//!
//! Each platform produces its own ordered list of conditions. A report is
//! ready when no condition failed; warnings are informational.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::locate::{infra_checkout, repo_worktree};
use super::types::Platform;
use crate::config::Config;
use crate::error::{EtzError, Result};

/// `pod 'Shared', :path => '../mobile-infra/build/xcframework'`
const LOCAL_POD_PATTERN: &str =
    r#"(?m)^\s*pod\s+['"]([^'"]+)['"]\s*,\s*:path\s*=>\s*['"]([^'"]+)['"]"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionStatus {
    Pass,
    Warning,
    Fail,
}

/// Automated remedy a caller may run for a failed condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixAction {
    PodInstall,
    BuildInfraIos,
}

impl FixAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixAction::PodInstall => "pod_install",
            FixAction::BuildInfraIos => "build_infra_ios",
        }
    }
}

impl fmt::Display for FixAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixAction {
    type Err = EtzError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pod_install" => Ok(FixAction::PodInstall),
            "build_infra_ios" => Ok(FixAction::BuildInfraIos),
            _ => Err(EtzError::Validation("Unknown fix action".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreCondition {
    pub id: &'static str,
    pub name: &'static str,
    pub status: ConditionStatus,
    pub message: String,
    pub can_auto_fix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_action: Option<FixAction>,
}

impl PreCondition {
    fn pass(id: &'static str, name: &'static str, message: impl Into<String>) -> Self {
        Self::new(id, name, ConditionStatus::Pass, message)
    }

    fn warning(id: &'static str, name: &'static str, message: impl Into<String>) -> Self {
        Self::new(id, name, ConditionStatus::Warning, message)
    }

    fn fail(id: &'static str, name: &'static str, message: impl Into<String>) -> Self {
        Self::new(id, name, ConditionStatus::Fail, message)
    }

    fn new(
        id: &'static str,
        name: &'static str,
        status: ConditionStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name,
            status,
            message: message.into(),
            can_auto_fix: false,
            fix_action: None,
        }
    }

    fn fixable(mut self, action: FixAction) -> Self {
        self.can_auto_fix = true;
        self.fix_action = Some(action);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreConditionReport {
    pub ready: bool,
    pub conditions: Vec<PreCondition>,
}

impl PreConditionReport {
    fn from_conditions(conditions: Vec<PreCondition>) -> Self {
        let ready = conditions
            .iter()
            .all(|c| c.status != ConditionStatus::Fail);
        Self { ready, conditions }
    }
}

/// Inspect the `repo` worktree of `label` for build readiness on `platform`
pub fn check_pre_conditions(
    config: &Config,
    label: &str,
    platform: Platform,
    repo: &str,
) -> Result<PreConditionReport> {
    let worktree = repo_worktree(config, label, repo)?;
    let conditions = match platform {
        Platform::Ios => ios_conditions(&worktree),
        Platform::Android => android_conditions(config, label, &worktree),
    };
    Ok(PreConditionReport::from_conditions(conditions))
}

fn ios_conditions(worktree: &Path) -> Vec<PreCondition> {
    let podfile = worktree.join("Podfile");
    let mut conditions = Vec::new();

    if podfile.is_file() {
        conditions.push(check_pods_in_sync(worktree));

        let contents = fs::read_to_string(&podfile).unwrap_or_default();
        match local_pod_reference(&contents) {
            Some((pod, path)) => {
                conditions.push(PreCondition::pass(
                    "infra_reference",
                    "Infra reference",
                    format!("Pod '{pod}' uses local path {path}"),
                ));
                conditions.push(check_local_artifacts(&worktree.join(&path)));
            }
            None => conditions.push(PreCondition::warning(
                "infra_reference",
                "Infra reference",
                "Podfile references published infra artifacts, not a local build",
            )),
        }
        conditions.push(check_tool("tool_pod", "pod", "CocoaPods"));
    } else {
        conditions.push(PreCondition::pass(
            "pods_installed",
            "CocoaPods",
            "No Podfile; CocoaPods not used",
        ));
    }

    conditions.push(check_tool("tool_xcodebuild", "xcodebuild", "Xcode"));
    conditions
}

/// `Podfile.lock` must match the `Pods/Manifest.lock` written by the last install
fn check_pods_in_sync(worktree: &Path) -> PreCondition {
    const ID: &str = "pods_installed";
    const NAME: &str = "CocoaPods";

    let lock = fs::read_to_string(worktree.join("Podfile.lock"));
    let manifest = fs::read_to_string(worktree.join("Pods").join("Manifest.lock"));

    match (lock, manifest) {
        (Ok(lock), Ok(manifest)) if lock == manifest => {
            PreCondition::pass(ID, NAME, "Pods are installed and up to date")
        }
        (Ok(_), Ok(_)) => PreCondition::fail(ID, NAME, "Pods are out of sync with Podfile.lock")
            .fixable(FixAction::PodInstall),
        (Err(_), _) => PreCondition::fail(ID, NAME, "Podfile.lock missing; pods never installed")
            .fixable(FixAction::PodInstall),
        (Ok(_), Err(_)) => PreCondition::fail(ID, NAME, "Pods directory missing")
            .fixable(FixAction::PodInstall),
    }
}

/// First `pod 'Name', :path => '...'` entry in a Podfile
pub fn local_pod_reference(podfile: &str) -> Option<(String, String)> {
    let re = Regex::new(LOCAL_POD_PATTERN).ok()?;
    let caps = re.captures(podfile)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

fn check_local_artifacts(path: &Path) -> PreCondition {
    const ID: &str = "infra_artifacts";
    const NAME: &str = "Infra build";
    if path.exists() {
        PreCondition::pass(ID, NAME, format!("Found {}", path.display()))
    } else {
        PreCondition::fail(ID, NAME, format!("Missing {}", path.display()))
            .fixable(FixAction::BuildInfraIos)
    }
}

fn android_conditions(config: &Config, label: &str, worktree: &Path) -> Vec<PreCondition> {
    let mut conditions = Vec::new();

    match infra_checkout(config, label) {
        Some((repo, checkout)) => {
            let artifacts: PathBuf = checkout.join(&config.build.infra_android_artifacts);
            conditions.push(if artifacts.is_dir() {
                PreCondition::pass(
                    "infra_artifacts",
                    "Infra artifacts",
                    format!("Found {} artifacts at {}", repo.name, artifacts.display()),
                )
            } else {
                PreCondition::fail(
                    "infra_artifacts",
                    "Infra artifacts",
                    format!(
                        "Missing {}; publish {} first",
                        artifacts.display(),
                        repo.name
                    ),
                )
            });
        }
        None => conditions.push(PreCondition::warning(
            "infra_artifacts",
            "Infra artifacts",
            "No infra repository configured",
        )),
    }

    conditions.push(if worktree.join("gradlew").is_file() {
        PreCondition::pass("gradle_wrapper", "Gradle wrapper", "gradlew present")
    } else {
        PreCondition::fail("gradle_wrapper", "Gradle wrapper", "gradlew not found")
    });

    conditions.push(check_tool("tool_java", "java", "Java"));
    conditions
}

fn check_tool(id: &'static str, binary: &str, name: &'static str) -> PreCondition {
    match which::which(binary) {
        Ok(path) => PreCondition::pass(id, name, format!("{binary} at {}", path.display())),
        Err(_) => PreCondition::warning(id, name, format!("{binary} not found on PATH")),
    }
}
