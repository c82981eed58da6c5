//! `etz status`: show worktree groups
//! Usage: etz status [label]

use colored::Colorize;

use super::{to_json, Context};
use crate::error::{EtzError, Result};
use crate::listing::{get_one, list_all, WorktreeGroup};

pub fn execute(ctx: &Context, label: Option<&str>) -> Result<bool> {
    let groups = match label {
        Some(label) => {
            let group = get_one(&ctx.config, &ctx.git, label)?
                .ok_or_else(|| EtzError::WorktreeNotFound(label.to_string()))?;
            vec![group]
        }
        None => list_all(&ctx.config, &ctx.git)?,
    };

    if ctx.json {
        println!("{}", to_json(&groups)?);
        return Ok(true);
    }

    if groups.is_empty() {
        println!(
            "No worktree groups under {}",
            ctx.config.worktree_root.display()
        );
        return Ok(true);
    }

    for group in &groups {
        print_group(ctx, group);
    }
    Ok(true)
}

fn print_group(ctx: &Context, group: &WorktreeGroup) {
    let building = ctx
        .builds
        .get_active_build_info(&group.label)
        .map(|info| format!(" [{} running]", info.build_type).magenta().to_string())
        .unwrap_or_default();
    println!("{}{building}", group.label.bold());

    for repo in &group.repos {
        if !repo.exists {
            println!("  {} {}", "-".dimmed(), repo.name.dimmed());
            continue;
        }
        let branch = repo.branch.as_deref().unwrap_or("(detached)");
        let state = if repo.clean {
            "clean".green().to_string()
        } else {
            format!("{} uncommitted", repo.uncommitted).yellow().to_string()
        };
        println!("  {} {}  {}  {state}", "●".green(), repo.name.cyan(), branch);
    }
    println!();
}
