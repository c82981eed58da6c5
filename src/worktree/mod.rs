//! Worktree orchestration across repositories
//!
//! A label maps to `worktree_root/<label>/<repo>` for every configured
//! repository. This module creates those worktrees.
//!
//! ## Module structure
//!
//! - `base`: Base branch resolution for new branches
//! - `create`: The per-repository create algorithm

mod base;
mod create;


pub use base::{resolve_base_branch, BaseSource, ResolvedBase};
pub use create::{create_worktree_group, CreateAction, CreateRequest};
