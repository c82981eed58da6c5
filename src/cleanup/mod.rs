//! Cleanup of worktree groups
//!
//! Removing a label kills its active builds, then for every repository
//! removes the git worktree, its Xcode derived data and the directory
//! itself, optionally deleting the local branch. The label folder goes too
//! once it is empty.

mod clean;
pub mod derived_data;


pub use clean::{clean_worktree_group, CleanRequest};
