//! `etz new`: create a worktree group
//! Usage: etz new <label> [-b BRANCH] [--repo-branch REPO=BRANCH] [--base REPO=BRANCH]

use colored::Colorize;
use std::collections::HashMap;

use super::output::{print_results, print_summary, separator};
use super::{to_json, Context};
use crate::error::Result;
use crate::models::all_succeeded;
use crate::worktree::{create_worktree_group, CreateRequest};

pub struct NewArgs {
    pub label: String,
    pub branch: Option<String>,
    pub repo_branches: Vec<(String, String)>,
    pub base_branches: Vec<(String, String)>,
    pub repo: Option<String>,
    pub dry_run: bool,
}

impl NewArgs {
    fn into_request(self) -> CreateRequest {
        CreateRequest {
            default_branch: self.branch.or_else(|| Some(self.label.clone())),
            branch_overrides: self.repo_branches.into_iter().collect::<HashMap<_, _>>(),
            base_branch_overrides: self.base_branches.into_iter().collect::<HashMap<_, _>>(),
            repo_filter: self.repo,
            dry_run: self.dry_run,
            label: self.label,
        }
    }
}

/// Returns whether every repository succeeded
pub fn execute(ctx: &Context, args: NewArgs) -> Result<bool> {
    let request = args.into_request();

    if !ctx.json {
        println!(
            "Creating worktrees for {}{}",
            request.label.bold(),
            if request.dry_run {
                " (dry run)".yellow().to_string()
            } else {
                String::new()
            }
        );
        separator();
    }

    let results = create_worktree_group(&ctx.config, &ctx.git, &request)?;
    let ok = all_succeeded(&results);

    if ctx.json {
        println!("{}", to_json(&results)?);
    } else {
        print_results(&results);
        print_summary(ok, "Worktree group ready");
        if ok && !request.dry_run {
            println!(
                "  {}",
                ctx.config.label_dir(&request.label).display().to_string().dimmed()
            );
        }
    }

    Ok(ok)
}
