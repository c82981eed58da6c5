//! `etz check`, `etz build` and `etz fix`
//!
//! Usage:
//!   etz check <label> <repo> [--platform ios|android]
//!   etz build <label> <repo> [--platform ios|android]
//!   etz fix <label> <repo> <action>

use colored::Colorize;

use super::output::separator;
use super::{to_json, Context};
use crate::build::{
    check_pre_conditions, run_build, run_fix_action, BuildProgress, ConditionStatus, Platform,
};
use crate::error::{EtzError, Result};
use crate::repo_type::{detect_with_name, RepoType};

/// Lines of build output shown after a failure
const FAILURE_TAIL: usize = 20;

/// Use the explicit platform or infer it from the repository layout
fn resolve_platform(
    ctx: &Context,
    label: &str,
    repo: &str,
    explicit: Option<Platform>,
) -> Result<Platform> {
    if let Some(platform) = explicit {
        return Ok(platform);
    }
    let path = ctx.config.worktree_path(label, repo);
    match detect_with_name(&path, repo) {
        RepoType::Ios => Ok(Platform::Ios),
        RepoType::Android => Ok(Platform::Android),
        other => Err(EtzError::Validation(format!(
            "Cannot infer platform for '{repo}' (detected {other}); pass --platform"
        ))),
    }
}

pub fn check(ctx: &Context, label: &str, repo: &str, platform: Option<Platform>) -> Result<bool> {
    let platform = resolve_platform(ctx, label, repo, platform)?;
    let report = check_pre_conditions(&ctx.config, label, platform, repo)?;

    if ctx.json {
        println!("{}", to_json(&report)?);
        return Ok(report.ready);
    }

    println!("Pre-conditions for {} ({platform})", format!("{label}/{repo}").bold());
    separator();
    for condition in &report.conditions {
        let glyph = match condition.status {
            ConditionStatus::Pass => "✓".green().bold(),
            ConditionStatus::Warning => "!".yellow().bold(),
            ConditionStatus::Fail => "✗".red().bold(),
        };
        println!("  {glyph} {}  {}", condition.name, condition.message.dimmed());
        if let Some(action) = condition.fix_action {
            println!(
                "      fix: {}",
                format!("etz fix {label} {repo} {action}").cyan()
            );
        }
    }
    println!();
    if report.ready {
        println!("{} Ready to build", "✓".green().bold());
    } else {
        println!("{} Not ready to build", "✗".red().bold());
    }
    Ok(report.ready)
}

pub fn build(ctx: &Context, label: &str, repo: &str, platform: Option<Platform>) -> Result<bool> {
    let platform = resolve_platform(ctx, label, repo, platform)?;
    let json = ctx.json;

    if !json {
        println!("Building {} ({platform})", format!("{label}/{repo}").bold());
        separator();
    }

    let outcome = run_build(&ctx.builds, &ctx.config, label, platform, repo, |p| {
        if !json {
            print_progress(&p);
        }
    });

    if json {
        println!("{}", to_json(&outcome)?);
        return Ok(outcome.success);
    }

    println!();
    if outcome.success {
        let secs = outcome.duration_ms.unwrap_or(0) as f64 / 1000.0;
        println!("{} Build succeeded in {secs:.1}s", "✓".green().bold());
    } else {
        print_failure_tail(outcome.output.as_deref().unwrap_or_default());
        println!(
            "{} Build failed: {}",
            "✗".red().bold(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(outcome.success)
}

pub fn fix(ctx: &Context, label: &str, repo: &str, action: &str) -> Result<bool> {
    let json = ctx.json;
    if !json {
        println!("Running {} for {}", action.bold(), format!("{label}/{repo}").bold());
        separator();
    }

    let result = run_fix_action(&ctx.builds, &ctx.config, label, repo, action, |p| {
        if !json {
            print_progress(&p);
        }
    });

    if json {
        println!("{}", to_json(&result)?);
    } else if result.success {
        println!("\n{} {action} finished", "✓".green().bold());
    } else {
        print_failure_tail(&result.output);
        println!(
            "\n{} {action} failed: {}",
            "✗".red().bold(),
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(result.success)
}

fn print_progress(progress: &BuildProgress) {
    println!(
        "{} {}",
        format!("[{:>3}%]", progress.percent).dimmed(),
        progress.line
    );
}

fn print_failure_tail(output: &[String]) {
    if output.is_empty() {
        return;
    }
    let skip = output.len().saturating_sub(FAILURE_TAIL);
    println!("{}", "Last output:".dimmed());
    for line in &output[skip..] {
        println!("  {}", line.dimmed());
    }
}
