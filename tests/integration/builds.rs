//! Build mutual exclusion and cancellation with real subprocesses

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use etz::build::{run_build, BuildCommand, BuildTracker, BuildType, Platform, BUILD_CANCELLED};
use etz::cleanup::{clean_worktree_group, CleanRequest};
use etz::git::SystemGit;
use etz::models::{all_succeeded, CleanStatus};
use etz::worktree::{create_worktree_group, CreateRequest};

use super::helpers::*;

fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    cond()
}

fn write_gradlew(dir: &Path, body: &str) {
    let path = dir.join("gradlew");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn android_workspace(label: &str) -> Workspace {
    let ws = Workspace::new(&["app-android"]);
    let results = create_worktree_group(
        &ws.config,
        &SystemGit,
        &CreateRequest::new(label).with_branch(label),
    )
    .unwrap();
    assert!(all_succeeded(&results));
    ws
}

#[test]
fn test_same_key_is_rejected_while_running() {
    let ws = android_workspace("auth");
    write_gradlew(&ws.worktree("auth", "app-android"), "echo started; sleep 30");

    let tracker = BuildTracker::new();
    let background = {
        let tracker = tracker.clone();
        let config = ws.config.clone();
        thread::spawn(move || {
            run_build(&tracker, &config, "auth", Platform::Android, "app-android", |_| {})
        })
    };

    assert!(wait_for(Duration::from_secs(10), || {
        tracker.is_build_in_progress("auth", Some(BuildType::BuildAndroid))
    }));

    let second = run_build(
        &tracker,
        &ws.config,
        "auth",
        Platform::Android,
        "app-android",
        |_| {},
    );
    assert!(!second.success);
    assert!(
        second.error.as_deref().unwrap_or("").contains("already in progress"),
        "{:?}",
        second.error
    );

    // A different build type for the same label is independent
    let pods = tracker
        .run(
            "auth",
            BuildType::PodInstall,
            vec![BuildCommand::new("sh", ws.temp.path()).args(["-c", "echo pods"])],
            |_| {},
        )
        .unwrap();
    assert!(pods.success);

    assert!(tracker.kill_build("auth", BuildType::BuildAndroid));
    let first = background.join().unwrap();
    assert!(!first.success);
    assert_eq!(first.error.as_deref(), Some(BUILD_CANCELLED));
    assert!(!tracker.is_build_in_progress("auth", None));
}

#[test]
fn test_clean_kills_builds_of_its_label() {
    let ws = android_workspace("auth");
    write_gradlew(&ws.worktree("auth", "app-android"), "sleep 30");

    let tracker = BuildTracker::new();
    let background = {
        let tracker = tracker.clone();
        let config = ws.config.clone();
        thread::spawn(move || {
            run_build(&tracker, &config, "auth", Platform::Android, "app-android", |_| {})
        })
    };
    assert!(wait_for(Duration::from_secs(10), || {
        tracker.get_active_build_info("auth").is_some()
    }));

    let started = Instant::now();
    let cleaned = clean_worktree_group(
        &ws.config,
        &SystemGit,
        &tracker,
        &CleanRequest::new("auth").force(true),
    )
    .unwrap();

    assert!(cleaned.iter().all(|r| r.status == CleanStatus::Deleted));
    let outcome = background.join().unwrap();
    assert_eq!(outcome.error.as_deref(), Some(BUILD_CANCELLED));
    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(!tracker.is_build_in_progress("auth", None));
}

#[test]
fn test_build_in_missing_worktree_fails_without_registering() {
    let ws = Workspace::new(&["app-android"]);
    let tracker = BuildTracker::new();

    let outcome = run_build(
        &tracker,
        &ws.config,
        "nowhere",
        Platform::Android,
        "app-android",
        |_| {},
    );

    assert!(!outcome.success);
    assert!(outcome.output.is_none());
    assert!(tracker.active_builds().is_empty());
}
