//! `etz detect`: show the detected type of each repository
//! Usage: etz detect [label]

use colored::Colorize;
use serde::Serialize;

use super::{to_json, Context};
use crate::error::Result;
use crate::repo_type::{detect_with_name, RepoType};
use crate::validation::validate_label;

#[derive(Serialize)]
struct Detection {
    repo: String,
    path: String,
    repo_type: RepoType,
}

/// Inspects each repository's worktree under `label`, or its primary clone
pub fn execute(ctx: &Context, label: Option<&str>) -> Result<bool> {
    if let Some(label) = label {
        validate_label(label)?;
    }

    let detections: Vec<Detection> = ctx
        .config
        .repositories
        .iter()
        .map(|repo| {
            let path = label
                .map(|l| ctx.config.worktree_path(l, &repo.name))
                .filter(|p| p.is_dir())
                .unwrap_or_else(|| repo.base_path.clone());
            Detection {
                repo: repo.name.clone(),
                repo_type: detect_with_name(&path, &repo.name),
                path: path.display().to_string(),
            }
        })
        .collect();

    if ctx.json {
        println!("{}", to_json(&detections)?);
    } else {
        for d in &detections {
            println!(
                "  {:<8} {}  {}",
                d.repo_type.to_string().bold(),
                d.repo.cyan(),
                d.path.dimmed()
            );
        }
    }
    Ok(true)
}
