//! Conflicts, idempotence and base branch selection

use etz::git::SystemGit;
use etz::models::{all_succeeded, CreateStatus};
use etz::worktree::{create_worktree_group, CreateRequest};

use super::helpers::*;

#[test]
fn test_branch_checked_out_elsewhere_is_reported_per_repo() {
    let ws = Workspace::new(&["app", "lib"]);

    // `main` is checked out in both primary clones
    let results = create_worktree_group(
        &ws.config,
        &SystemGit,
        &CreateRequest::new("hotfix")
            .with_branch("hotfix")
            .branch_for("app", "main"),
    )
    .unwrap();

    assert!(!all_succeeded(&results));
    let app = results.iter().find(|r| r.repo_name == "app").unwrap();
    assert_eq!(app.status, CreateStatus::AlreadyInUse);
    assert!(!app.success);
    assert!(app.message.contains("already checked out"), "{}", app.message);
    assert!(!ws.worktree("hotfix", "app").exists());

    let lib = results.iter().find(|r| r.repo_name == "lib").unwrap();
    assert_eq!(lib.status, CreateStatus::CreatedNew);
    assert!(ws.worktree("hotfix", "lib").exists());
}

#[test]
fn test_second_create_touches_nothing() {
    let ws = Workspace::new(&["app", "lib"]);
    let request = CreateRequest::new("auth").with_branch("feature/auth");

    let first = RecordingGit::new();
    create_worktree_group(&ws.config, &first, &request).unwrap();
    assert!(first.mutating_calls().contains(&"add_worktree"));

    let second = RecordingGit::new();
    let results = create_worktree_group(&ws.config, &second, &request).unwrap();

    assert!(all_succeeded(&results));
    assert!(results
        .iter()
        .all(|r| r.status == CreateStatus::AlreadyExists));
    assert!(
        second.mutating_calls().is_empty(),
        "unexpected git calls: {:?}",
        second.calls()
    );
}

#[test]
fn test_per_repo_base_overrides_config_base() {
    let ws = Workspace::new(&["app", "lib"]);
    push_develop_with_marker(&ws.repo("app"));
    push_develop_with_marker(&ws.repo("lib"));

    let results = create_worktree_group(
        &ws.config,
        &SystemGit,
        &CreateRequest::new("feat")
            .with_branch("feat")
            .base_for("app", "develop"),
    )
    .unwrap();
    assert!(all_succeeded(&results));

    assert!(ws.worktree("feat", "app").join("marker.txt").exists());
    assert!(!ws.worktree("feat", "lib").join("marker.txt").exists());

    let app = results.iter().find(|r| r.repo_name == "app").unwrap();
    assert!(app.message.contains("origin/develop"), "{}", app.message);
}

#[test]
fn test_remote_only_branch_is_tracked() {
    let ws = Workspace::new(&["app"]);
    let repo = ws.repo("app");
    git(&["checkout", "-b", "shared"], &repo);
    git(&["push", "origin", "shared"], &repo);
    git(&["checkout", "main"], &repo);
    git(&["branch", "-D", "shared"], &repo);

    let results = create_worktree_group(
        &ws.config,
        &SystemGit,
        &CreateRequest::new("pair").with_branch("shared"),
    )
    .unwrap();

    assert_eq!(results[0].status, CreateStatus::AddedRemote);
    let wt = ws.worktree("pair", "app");
    assert_eq!(
        git(&["rev-parse", "--abbrev-ref", "shared@{upstream}"], &wt),
        "origin/shared"
    );
}

#[test]
fn test_dry_run_creates_nothing() {
    let ws = Workspace::new(&["app"]);
    let spy = RecordingGit::new();

    let results = create_worktree_group(
        &ws.config,
        &spy,
        &CreateRequest::new("plan").with_branch("plan").dry_run(true),
    )
    .unwrap();

    assert_eq!(results[0].status, CreateStatus::DryRun);
    assert!(spy.mutating_calls().is_empty());
    assert!(!ws.config.label_dir("plan").exists());
}
