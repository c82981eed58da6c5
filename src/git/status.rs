//! Working tree status
//!
//! Parses `git status --porcelain=v1 --branch` into counts of staged,
//! modified and untracked entries plus ahead/behind against upstream.

use serde::Serialize;
use std::path::Path;

use super::runner::run_git_checked;
use crate::error::Result;

/// Status summary for one working tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    pub clean: bool,
    pub modified: usize,
    pub staged: usize,
    pub untracked: usize,
    pub ahead: usize,
    pub behind: usize,
    /// Number of porcelain entries (each changed or untracked path counts once)
    pub uncommitted: usize,
}

/// Run `git status` in `path` and parse it
pub fn get_status(path: &Path) -> Result<RepoStatus> {
    let stdout = run_git_checked(&["status", "--porcelain=v1", "--branch"], path)?;
    Ok(parse_status(&stdout))
}

/// Parse porcelain v1 output with a `## ` branch header
pub(crate) fn parse_status(output: &str) -> RepoStatus {
    let mut status = RepoStatus::default();

    for line in output.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            let (ahead, behind) = parse_ahead_behind(header);
            status.ahead = ahead;
            status.behind = behind;
            continue;
        }

        // Porcelain format: XY filename
        let mut chars = line.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            continue;
        };

        status.uncommitted += 1;

        if index == '?' && worktree == '?' {
            status.untracked += 1;
            continue;
        }
        if index != ' ' {
            status.staged += 1;
        }
        if worktree != ' ' {
            status.modified += 1;
        }
    }

    status.clean = status.uncommitted == 0;
    status
}

/// Extract `[ahead N, behind M]` from a branch header line
fn parse_ahead_behind(header: &str) -> (usize, usize) {
    let Some(start) = header.find('[') else {
        return (0, 0);
    };
    let Some(end) = header[start..].find(']') else {
        return (0, 0);
    };

    let mut ahead = 0;
    let mut behind = 0;
    for part in header[start + 1..start + end].split(',') {
        let part = part.trim();
        if let Some(n) = part.strip_prefix("ahead ") {
            ahead = n.trim().parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            behind = n.trim().parse().unwrap_or(0);
        }
    }
    (ahead, behind)
}
