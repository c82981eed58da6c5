//! etz: one label, one worktree per repository
//!
//! Creates, lists and removes groups of git worktrees that span several
//! repositories of one product, and tracks the platform builds run inside
//! them.

pub mod build;
pub mod cleanup;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod listing;
pub mod models;
pub mod process;
pub mod repo_type;
pub mod validation;
pub mod worktree;

#[cfg(test)]
mod testing;

pub use error::{EtzError, Result};
