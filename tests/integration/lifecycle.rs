//! Create, list and clean a worktree group end to end

use std::fs;

use etz::build::BuildTracker;
use etz::cleanup::{clean_worktree_group, CleanRequest};
use etz::git::SystemGit;
use etz::listing::{get_one, list_all};
use etz::models::{all_succeeded, CleanStatus, CreateStatus};
use etz::worktree::{create_worktree_group, CreateRequest};

use super::helpers::*;

#[test]
fn test_create_list_clean_round_trip() {
    let ws = Workspace::new(&["app-ios", "app-android"]);
    let system = SystemGit;

    let created = create_worktree_group(
        &ws.config,
        &system,
        &CreateRequest::new("auth").with_branch("feature/auth"),
    )
    .expect("create failed");

    assert!(all_succeeded(&created));
    assert_eq!(created.len(), 2);
    for result in &created {
        assert_eq!(result.status, CreateStatus::CreatedNew, "{}", result.message);
    }
    for name in ["app-ios", "app-android"] {
        let wt = ws.worktree("auth", name);
        assert!(wt.join("README.md").exists());
        assert_eq!(
            git(&["rev-parse", "--abbrev-ref", "HEAD"], &wt),
            "feature/auth"
        );
    }

    let groups = list_all(&ws.config, &system).expect("list failed");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "auth");
    assert_eq!(groups[0].existing().count(), 2);
    assert!(groups[0].is_clean());

    fs::write(ws.worktree("auth", "app-ios").join("wip.txt"), "wip").unwrap();
    let group = get_one(&ws.config, &system, "auth")
        .expect("get failed")
        .expect("group missing");
    let ios = group.repos.iter().find(|r| r.name == "app-ios").unwrap();
    assert!(!ios.clean);
    assert_eq!(ios.uncommitted, 1);
    assert!(!group.is_clean());

    let cleaned = clean_worktree_group(
        &ws.config,
        &system,
        &BuildTracker::new(),
        &CleanRequest::new("auth").force(true),
    )
    .expect("clean failed");

    assert!(all_succeeded(&cleaned));
    assert_eq!(cleaned.len(), 3);
    assert_eq!(cleaned[2].repo_name, "auth/");
    assert!(cleaned.iter().all(|r| r.status == CleanStatus::Deleted));
    assert!(!ws.config.label_dir("auth").exists());
    assert!(list_all(&ws.config, &system).unwrap().is_empty());
    assert!(get_one(&ws.config, &system, "auth").unwrap().is_none());

    // Branch survives cleanup unless asked otherwise
    assert!(!git(&["branch", "--list", "feature/auth"], &ws.repo("app-ios")).is_empty());
}

#[test]
fn test_recreate_after_clean_with_branch_deletion() {
    let ws = Workspace::new(&["api"]);
    let system = SystemGit;
    let request = CreateRequest::new("retry").with_branch("retry");

    create_worktree_group(&ws.config, &system, &request).unwrap();
    let cleaned = clean_worktree_group(
        &ws.config,
        &system,
        &BuildTracker::new(),
        &CleanRequest::new("retry").delete_branches(true),
    )
    .unwrap();
    assert!(all_succeeded(&cleaned));
    assert!(git(&["branch", "--list", "retry"], &ws.repo("api")).is_empty());

    let again = create_worktree_group(&ws.config, &system, &request).unwrap();
    assert_eq!(again[0].status, CreateStatus::CreatedNew);
}

#[test]
fn test_partial_group_listed_with_missing_repo() {
    let ws = Workspace::new(&["one", "two"]);
    let system = SystemGit;

    create_worktree_group(
        &ws.config,
        &system,
        &CreateRequest::new("solo").with_branch("solo").only_repo("one"),
    )
    .unwrap();

    let group = get_one(&ws.config, &system, "solo").unwrap().unwrap();
    assert_eq!(group.repos.len(), 2);
    let two = group.repos.iter().find(|r| r.name == "two").unwrap();
    assert!(!two.exists);
    assert_eq!(group.existing().count(), 1);
}
