//! Fix actions and full app builds
//!
//! Both resolve the checkout to run in, assemble the command phases and hand
//! them to the [`BuildTracker`]. The iOS build archives first and exports the
//! archive second; a failed export fails the build.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::locate::{infra_checkout, repo_worktree};
use super::preconditions::FixAction;
use super::tracker::BuildTracker;
use super::types::{BuildCommand, BuildProgress, BuildType, Platform, RunOutput};
use crate::cleanup::derived_data::xcode_project_name;
use crate::config::{BuildSettings, Config};
use crate::error::{EtzError, Result};

/// Directory (inside the iOS worktree) receiving the archive and export
const BUILD_OUTPUT_DIR: &str = "build";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixResult {
    pub success: bool,
    pub output: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FixResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Vec::new(),
            error: Some(error.into()),
        }
    }
}

impl From<RunOutput> for FixResult {
    fn from(run: RunOutput) -> Self {
        Self {
            success: run.success,
            output: run.output,
            error: run.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub success: bool,
    pub platform: Platform,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run a named fix action reported by a pre-condition check.
///
/// `pod_install` runs in the `repo` worktree; `build_infra_ios` runs the
/// infra repository's framework task. Unknown names fail without running
/// anything.
pub fn run_fix_action<F>(
    tracker: &BuildTracker,
    config: &Config,
    label: &str,
    repo: &str,
    action: &str,
    on_progress: F,
) -> FixResult
where
    F: FnMut(BuildProgress),
{
    let Ok(action) = action.parse::<FixAction>() else {
        return FixResult::failed("Unknown fix action");
    };

    let plan = match action {
        FixAction::PodInstall => pod_install_plan(config, label, repo),
        FixAction::BuildInfraIos => infra_ios_plan(config, label),
    };

    match plan.and_then(|(build_type, phases)| {
        info!("Running fix '{action}' for {label}/{repo}");
        tracker.run(label, build_type, phases, on_progress)
    }) {
        Ok(run) => run.into(),
        Err(e) => FixResult::failed(e.to_string()),
    }
}

/// Build the app in the `repo` worktree of `label`
pub fn run_build<F>(
    tracker: &BuildTracker,
    config: &Config,
    label: &str,
    platform: Platform,
    repo: &str,
    on_progress: F,
) -> BuildOutcome
where
    F: FnMut(BuildProgress),
{
    let phases = repo_worktree(config, label, repo).and_then(|worktree| match platform {
        Platform::Ios => ios_build_phases(&config.build, &worktree),
        Platform::Android => Ok(android_build_phases(&config.build, &worktree)),
    });

    let result =
        phases.and_then(|phases| tracker.run(label, platform.build_type(), phases, on_progress));

    match result {
        Ok(run) => BuildOutcome {
            success: run.success,
            platform,
            repo: repo.to_string(),
            duration_ms: Some(u64::try_from(run.duration.as_millis()).unwrap_or(u64::MAX)),
            output: Some(run.output),
            error: run.error,
        },
        Err(e) => BuildOutcome {
            success: false,
            platform,
            repo: repo.to_string(),
            duration_ms: None,
            output: None,
            error: Some(e.to_string()),
        },
    }
}

fn pod_install_plan(
    config: &Config,
    label: &str,
    repo: &str,
) -> Result<(BuildType, Vec<BuildCommand>)> {
    let worktree = repo_worktree(config, label, repo)?;
    let phases = vec![BuildCommand::new("pod", &worktree).arg("install")];
    Ok((BuildType::PodInstall, phases))
}

fn infra_ios_plan(config: &Config, label: &str) -> Result<(BuildType, Vec<BuildCommand>)> {
    let (repo, checkout) = infra_checkout(config, label)
        .ok_or_else(|| EtzError::Validation("No infra repository configured".to_string()))?;
    info!("Building iOS framework in {} ({})", repo.name, checkout.display());
    let phases = vec![gradle(&checkout, &config.build.infra_ios_task)];
    Ok((BuildType::BuildInfraIos, phases))
}

fn android_build_phases(settings: &BuildSettings, worktree: &Path) -> Vec<BuildCommand> {
    vec![gradle(worktree, &settings.android_task)]
}

fn gradle(dir: &Path, task: &str) -> BuildCommand {
    BuildCommand::new("./gradlew", dir)
        .arg(task)
        .arg("--console=plain")
}

/// Archive, then export the archive to an installable package
fn ios_build_phases(settings: &BuildSettings, worktree: &Path) -> Result<Vec<BuildCommand>> {
    let (container_flag, container) = xcode_container(worktree)?;
    let scheme = match &settings.ios_scheme {
        Some(scheme) => scheme.clone(),
        None => xcode_project_name(worktree).ok_or_else(|| {
            EtzError::Build(format!("No Xcode project in {}", worktree.display()))
        })?,
    };

    let out = worktree.join(BUILD_OUTPUT_DIR);
    let archive = out.join(format!("{scheme}.xcarchive"));
    let export = out.join("export");
    let plist = worktree.join(&settings.export_options_plist);

    let archive_phase = BuildCommand::new("xcodebuild", worktree)
        .arg(container_flag)
        .arg(container.to_string_lossy())
        .args(["-scheme", scheme.as_str()])
        .args(["-configuration", settings.ios_configuration.as_str()])
        .args(["-destination", "generic/platform=iOS"])
        .arg("-archivePath")
        .arg(archive.to_string_lossy())
        .arg("archive");

    let export_phase = BuildCommand::new("xcodebuild", worktree)
        .arg("-exportArchive")
        .arg("-archivePath")
        .arg(archive.to_string_lossy())
        .arg("-exportPath")
        .arg(export.to_string_lossy())
        .arg("-exportOptionsPlist")
        .arg(plist.to_string_lossy());

    Ok(vec![archive_phase, export_phase])
}

/// `-workspace X.xcworkspace` when present, else `-project X.xcodeproj`
fn xcode_container(worktree: &Path) -> Result<(&'static str, PathBuf)> {
    let find = |ext: &str| -> Option<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(worktree)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == ext))
            .collect();
        found.sort();
        found.into_iter().next()
    };

    if let Some(workspace) = find("xcworkspace") {
        return Ok(("-workspace", workspace));
    }
    if let Some(project) = find("xcodeproj") {
        return Ok(("-project", project));
    }
    Err(EtzError::Build(format!(
        "No .xcworkspace or .xcodeproj in {}",
        worktree.display()
    )))
}
