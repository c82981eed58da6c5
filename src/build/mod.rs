//! Build process tracking
//!
//! External build tools (CocoaPods, Gradle, xcodebuild) run as OS
//! subprocesses tracked in a shared registry keyed by label and build type.
//! Output is streamed line by line into a bounded buffer and to a progress
//! callback.
//!
//! ## Module structure
//!
//! - `types`: Build types, platforms, commands and run results
//! - `output`: Bounded output line buffer
//! - `progress`: Heuristic progress estimation per build type
//! - `tracker`: The active build registry and subprocess driver
//! - `preconditions`: Read-only readiness checks per platform
//! - `pipelines`: Fix actions and full app builds

mod locate;
mod output;
mod pipelines;
mod preconditions;
mod progress;
mod tracker;
mod types;


pub use output::{OutputBuffer, MAX_OUTPUT_LINES};
pub use pipelines::{run_build, run_fix_action, BuildOutcome, FixResult};
pub use preconditions::{
    check_pre_conditions, local_pod_reference, ConditionStatus, FixAction, PreCondition,
    PreConditionReport,
};
pub use progress::ProgressEstimator;
pub use tracker::{BuildTracker, BUILD_CANCELLED};
pub use types::{
    ActiveBuildInfo, BuildCommand, BuildKey, BuildProgress, BuildType, Platform, RunOutput,
};
