//! `etz clean`: remove a worktree group
//! Usage: etz clean <label> [--repo REPO] [--force] [--delete-branches] [--dry-run]

use colored::Colorize;

use super::output::{print_results, print_summary, separator};
use super::{to_json, Context};
use crate::cleanup::{clean_worktree_group, CleanRequest};
use crate::error::Result;
use crate::models::all_succeeded;

/// Returns whether every repository succeeded
pub fn execute(ctx: &Context, request: CleanRequest) -> Result<bool> {
    if !ctx.json {
        println!(
            "Removing worktrees for {}{}",
            request.label.bold(),
            if request.dry_run {
                " (dry run)".yellow().to_string()
            } else {
                String::new()
            }
        );
        separator();
    }

    let results = clean_worktree_group(&ctx.config, &ctx.git, &ctx.builds, &request)?;
    let ok = all_succeeded(&results);

    if ctx.json {
        println!("{}", to_json(&results)?);
    } else {
        print_results(&results);
        print_summary(ok, "Cleanup complete");
    }

    Ok(ok)
}
