//! Integration tests for etz
//!
//! Each test builds bare origins with clones in a temp directory, writes a
//! config file pointing at them and drives the public engines end to end.

#[cfg(unix)]
pub mod builds;
pub mod conflicts;
pub mod helpers;
pub mod lifecycle;
pub mod security;
