//! Repository type detection
//!
//! Classifies a checkout as iOS, Android or infra so the presentation layer
//! can pick a build pipeline. Structure is inspected first (including one
//! level of subdirectories for monorepo layouts); the repository name is the
//! fallback.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    Ios,
    Android,
    Infra,
    Unknown,
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepoType::Ios => "ios",
            RepoType::Android => "android",
            RepoType::Infra => "infra",
            RepoType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Subdirectory names that mark a shared/infra repository
const INFRA_DIRS: &[&str] = &["shared", "common", "infra", "terraform"];

/// Detect by structure, falling back to the directory name
pub fn detect(path: &Path) -> RepoType {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    detect_with_name(path, name)
}

/// Detect by structure, falling back to an explicit repository name
pub fn detect_with_name(path: &Path, repo_name: &str) -> RepoType {
    if let Some(found) = detect_structure(path) {
        return found;
    }
    list_subdirs(path)
        .iter()
        .find_map(|sub| detect_markers(sub))
        .unwrap_or_else(|| detect_by_name(repo_name))
}

fn detect_structure(path: &Path) -> Option<RepoType> {
    if !path.is_dir() {
        return None;
    }
    detect_markers(path).or_else(|| {
        INFRA_DIRS
            .iter()
            .any(|d| path.join(d).is_dir())
            .then_some(RepoType::Infra)
    })
}

/// Platform project files directly inside `dir`
fn detect_markers(dir: &Path) -> Option<RepoType> {
    let entries = fs::read_dir(dir).ok()?;
    let names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();

    let is_ios = names.iter().any(|n| {
        n.ends_with(".xcodeproj") || n.ends_with(".xcworkspace") || n == "Podfile"
    });
    if is_ios {
        return Some(RepoType::Ios);
    }

    let has_manifest = dir.join("AndroidManifest.xml").is_file()
        || dir.join("app/src/main/AndroidManifest.xml").is_file()
        || dir.join("src/main/AndroidManifest.xml").is_file();
    let has_gradle = names
        .iter()
        .any(|n| n.starts_with("settings.gradle") || n.starts_with("build.gradle"));
    if has_manifest || (has_gradle && dir.join("app").is_dir()) {
        return Some(RepoType::Android);
    }

    None
}

fn list_subdirs(path: &Path) -> Vec<std::path::PathBuf> {
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    let mut dirs: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .collect();
    dirs.sort();
    dirs
}

/// Name heuristics: `.ios`/`-ios` suffixes, `android`, `infra`/`shared`/`common`
pub fn detect_by_name(repo_name: &str) -> RepoType {
    let name = repo_name.to_lowercase();

    if name.ends_with(".ios") || name.ends_with("-ios") || name.ends_with("_ios") || name == "ios"
    {
        return RepoType::Ios;
    }
    if name.ends_with("-android") || name.ends_with(".android") || name.contains("android") {
        return RepoType::Android;
    }
    if name.contains("infra") || name.contains("shared") || name.contains("common") {
        return RepoType::Infra;
    }
    if name.contains("ios") {
        return RepoType::Ios;
    }
    RepoType::Unknown
}
