//! Xcode derived data lookup
//!
//! Xcode stores build products under `<DerivedData>/<ProjectName>-<hash>`.
//! The project name comes from the first `*.xcworkspace` (preferred) or
//! `*.xcodeproj` found at the worktree root or one directory below it.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const WORKSPACE_EXT: &str = "xcworkspace";
const PROJECT_EXT: &str = "xcodeproj";

/// Xcode project name for a checkout, if it contains one
pub fn xcode_project_name(worktree: &Path) -> Option<String> {
    find_with_extension(worktree, WORKSPACE_EXT)
        .or_else(|| find_with_extension(worktree, PROJECT_EXT))
}

fn find_with_extension(dir: &Path, ext: &str) -> Option<String> {
    let mut dirs = vec![dir.to_path_buf()];
    dirs.extend(subdirectories(dir));

    dirs.iter().find_map(|d| {
        let mut names: Vec<String> = fs::read_dir(d)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == ext))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names.into_iter().next()
    })
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut subdirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| {
                    !n.starts_with('.') && !n.ends_with(WORKSPACE_EXT) && !n.ends_with(PROJECT_EXT)
                })
        })
        .collect();
    subdirs.sort();
    subdirs
}

/// Derived data directories belonging to the project in `worktree`
pub fn find_derived_data(worktree: &Path, derived_data_root: &Path) -> Vec<PathBuf> {
    let Some(project) = xcode_project_name(worktree) else {
        return Vec::new();
    };

    let pattern = derived_data_root
        .join(format!("{}-*", glob::Pattern::escape(&project)))
        .to_string_lossy()
        .into_owned();

    match glob::glob(&pattern) {
        Ok(paths) => {
            let mut found: Vec<PathBuf> = paths.flatten().filter(|p| p.is_dir()).collect();
            found.sort();
            debug!("Derived data for {project}: {} entries", found.len());
            found
        }
        Err(e) => {
            warn!("Invalid derived data pattern {pattern}: {e}");
            Vec::new()
        }
    }
}

/// Delete derived data directories; failures are logged and skipped.
/// Returns the directories that were removed.
pub fn remove_derived_data(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    dirs.into_iter()
        .filter(|dir| match fs::remove_dir_all(dir) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to remove derived data {}: {e}", dir.display());
                false
            }
        })
        .collect()
}
