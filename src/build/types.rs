//! Build tracker data types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::error::EtzError;

/// Kind of build subprocess; together with the label it keys the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildType {
    PodInstall,
    BuildInfraIos,
    BuildIos,
    BuildAndroid,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::PodInstall => "pod_install",
            BuildType::BuildInfraIos => "build_infra_ios",
            BuildType::BuildIos => "build_ios",
            BuildType::BuildAndroid => "build_android",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = EtzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pod_install" => Ok(BuildType::PodInstall),
            "build_infra_ios" => Ok(BuildType::BuildInfraIos),
            "build_ios" => Ok(BuildType::BuildIos),
            "build_android" => Ok(BuildType::BuildAndroid),
            other => Err(EtzError::Validation(format!("Unknown build type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Build type of the full app build for this platform
    pub fn build_type(&self) -> BuildType {
        match self {
            Platform::Ios => BuildType::BuildIos,
            Platform::Android => BuildType::BuildAndroid,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => f.write_str("ios"),
            Platform::Android => f.write_str("android"),
        }
    }
}

impl FromStr for Platform {
    type Err = EtzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(EtzError::Validation(format!("Unknown platform '{other}'"))),
        }
    }
}

/// Registry key: at most one active build per `(label, build_type)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildKey {
    pub label: String,
    pub build_type: BuildType,
}

impl BuildKey {
    pub fn new(label: &str, build_type: BuildType) -> Self {
        Self {
            label: label.to_string(),
            build_type,
        }
    }
}

/// One subprocess invocation of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl BuildCommand {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// `program arg1 arg2` for logs and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One output line forwarded to the progress callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildProgress {
    pub build_type: BuildType,
    pub line: String,
    /// Approximate completion, 0-100, never decreasing within a run
    pub percent: u8,
}

/// Snapshot of a running build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveBuildInfo {
    pub build_type: BuildType,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Result of one tracked run, across all of its phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub success: bool,
    pub output: Vec<String>,
    pub error: Option<String>,
    pub duration: Duration,
}
