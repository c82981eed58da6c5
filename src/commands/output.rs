//! Terminal rendering of per-repository results

use colored::Colorize;
use std::fmt::Display;

use crate::models::{CleanStatus, CreateStatus, RepoResult};

/// How a status line should look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Done,
    Neutral,
    Failed,
}

pub trait StatusTone {
    fn tone(&self) -> Tone;
}

impl StatusTone for CreateStatus {
    fn tone(&self) -> Tone {
        match self {
            CreateStatus::CreatedNew | CreateStatus::AddedLocal | CreateStatus::AddedRemote => {
                Tone::Done
            }
            CreateStatus::AlreadyExists | CreateStatus::DryRun | CreateStatus::Skipped => {
                Tone::Neutral
            }
            CreateStatus::AlreadyInUse | CreateStatus::Error => Tone::Failed,
        }
    }
}

impl StatusTone for CleanStatus {
    fn tone(&self) -> Tone {
        match self {
            CleanStatus::Deleted => Tone::Done,
            CleanStatus::NotFound | CleanStatus::DryRun => Tone::Neutral,
            CleanStatus::NotWorktree | CleanStatus::Error => Tone::Failed,
        }
    }
}

/// One line per repository: glyph, name, status, message
pub fn print_results<S: StatusTone + Display>(results: &[RepoResult<S>]) {
    let width = results
        .iter()
        .map(|r| r.repo_name.len())
        .max()
        .unwrap_or(0);

    for result in results {
        let (glyph, status) = match result.status.tone() {
            Tone::Done => ("✓".green().bold(), result.status.to_string().green()),
            Tone::Neutral => ("•".yellow(), result.status.to_string().yellow()),
            Tone::Failed => ("✗".red().bold(), result.status.to_string().red()),
        };
        let name = format!("{:<width$}", result.repo_name);
        println!("  {glyph} {}  {status}  {}", name.cyan(), result.message.dimmed());
    }
}

/// Closing summary line for a batch
pub fn print_summary(ok: bool, what: &str) {
    println!();
    if ok {
        println!("{} {what}", "✓".green().bold());
    } else {
        println!("{} {what} with errors", "✗".red().bold());
    }
}

pub fn separator() {
    println!("{}", "─".repeat(50).dimmed());
}
