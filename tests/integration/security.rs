//! Hostile labels and directories that escape the worktree root

use std::fs;

use etz::build::BuildTracker;
use etz::cleanup::{clean_worktree_group, CleanRequest};
use etz::git::SystemGit;
use etz::listing::get_one;
use etz::worktree::{create_worktree_group, CreateRequest};
use etz::EtzError;

use super::helpers::*;

const HOSTILE_LABELS: &[&str] = &["../escape", "a/../../b", "/etc", "..", ".hidden", ""];

#[test]
fn test_create_rejects_traversal_before_touching_git() {
    let ws = Workspace::new(&["app"]);

    for label in HOSTILE_LABELS {
        let spy = RecordingGit::new();
        let err = create_worktree_group(
            &ws.config,
            &spy,
            &CreateRequest::new(*label).with_branch("feature"),
        )
        .unwrap_err();
        assert!(matches!(err, EtzError::Validation(_)), "{label}: {err}");
        assert!(spy.calls().is_empty(), "{label}: {:?}", spy.calls());
    }
    assert!(!ws.temp.path().join("escape").exists());
}

#[test]
fn test_clean_and_get_reject_traversal() {
    let ws = Workspace::new(&["app"]);
    let outside = ws.temp.path().join("precious");
    fs::create_dir_all(outside.join("app")).unwrap();

    for label in HOSTILE_LABELS {
        let err = clean_worktree_group(
            &ws.config,
            &SystemGit,
            &BuildTracker::new(),
            &CleanRequest::new(*label).force(true),
        )
        .unwrap_err();
        assert!(matches!(err, EtzError::Validation(_)), "{label}: {err}");

        let err = get_one(&ws.config, &SystemGit, label).unwrap_err();
        assert!(matches!(err, EtzError::Validation(_)), "{label}: {err}");
    }

    let err = clean_worktree_group(
        &ws.config,
        &SystemGit,
        &BuildTracker::new(),
        &CleanRequest::new("../precious").force(true),
    )
    .unwrap_err();
    assert!(matches!(err, EtzError::Validation(_)));
    assert!(outside.join("app").exists());
}

#[cfg(unix)]
#[test]
fn test_symlinked_label_folder_is_refused() {
    let ws = Workspace::new(&["app"]);
    let outside = ws.temp.path().join("elsewhere");
    fs::create_dir_all(outside.join("app")).unwrap();
    fs::write(outside.join("app").join("keep.txt"), "keep").unwrap();

    fs::create_dir_all(&ws.config.worktree_root).unwrap();
    std::os::unix::fs::symlink(&outside, ws.config.label_dir("link")).unwrap();

    let err = clean_worktree_group(
        &ws.config,
        &SystemGit,
        &BuildTracker::new(),
        &CleanRequest::new("link").force(true),
    )
    .unwrap_err();

    assert!(matches!(err, EtzError::Security(_)), "{err}");
    assert_eq!(err.exit_code(), 7);
    assert!(outside.join("app").join("keep.txt").exists());
}
