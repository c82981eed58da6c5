//! Heuristic build progress
//!
//! Each build type has an ordered list of substrings its tool prints at
//! known stages. A matching line raises the estimate; the estimate never goes
//! down. The numbers are rough guides for a progress bar and nothing more.

use super::types::BuildType;

type Milestones = &'static [(&'static str, u8)];

const POD_INSTALL: Milestones = &[
    ("Analyzing dependencies", 10),
    ("Fetching podspec", 20),
    ("Downloading dependencies", 30),
    ("Installing ", 50),
    ("Generating Pods project", 80),
    ("Integrating client project", 90),
    ("Pod installation complete", 100),
];

const GRADLE_INFRA: Milestones = &[
    ("Configure project", 10),
    ("compileKotlin", 30),
    ("cinterop", 40),
    ("linkRelease", 60),
    ("linkDebug", 60),
    ("XCFramework", 85),
    ("BUILD SUCCESSFUL", 100),
];

const XCODEBUILD: Milestones = &[
    ("Resolve Package Graph", 5),
    ("Prepare build", 10),
    ("CompileC", 25),
    ("CompileSwift", 30),
    ("Linking", 60),
    ("Ld ", 60),
    ("CodeSign", 75),
    ("ARCHIVE SUCCEEDED", 85),
    ("Exported", 95),
    ("EXPORT SUCCEEDED", 100),
];

const GRADLE_ANDROID: Milestones = &[
    ("Configure project", 10),
    ("preBuild", 15),
    ("compileDebugKotlin", 35),
    ("compileReleaseKotlin", 35),
    ("dexBuilder", 60),
    ("mergeDex", 70),
    ("package", 85),
    ("BUILD SUCCESSFUL", 100),
];

/// Running progress estimate for one build
#[derive(Debug, Clone)]
pub struct ProgressEstimator {
    milestones: Milestones,
    current: u8,
}

impl ProgressEstimator {
    pub fn for_build_type(build_type: BuildType) -> Self {
        let milestones = match build_type {
            BuildType::PodInstall => POD_INSTALL,
            BuildType::BuildInfraIos => GRADLE_INFRA,
            BuildType::BuildIos => XCODEBUILD,
            BuildType::BuildAndroid => GRADLE_ANDROID,
        };
        Self {
            milestones,
            current: 0,
        }
    }

    /// Feed one output line and return the current estimate
    pub fn observe(&mut self, line: &str) -> u8 {
        let hit = self
            .milestones
            .iter()
            .filter(|(pattern, _)| line.contains(pattern))
            .map(|(_, percent)| *percent)
            .max();
        if let Some(percent) = hit {
            self.current = self.current.max(percent);
        }
        self.current
    }

    pub fn current(&self) -> u8 {
        self.current
    }
}
