//! What `brokkr version` reports: the build, and the artifact layout this
//! build reads

use brokkr_core::types::{DEFAULT_CAPABILITY, MANIFEST_FILENAME};
use brokkr_modules::ServiceDescriptorScanner;
use serde::{Deserialize, Serialize};

/// Build and artifact format information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Semantic version
    pub version: String,

    /// Git commit SHA (short)
    pub commit: Option<String>,

    /// Target triple
    pub target: Option<String>,

    /// Artifact format produced by `brokkr pack` and read during resolution
    pub artifact: ArtifactFormat,
}

/// Where an artifact keeps its manifest and entry points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFormat {
    pub archive: String,
    pub manifest: String,
    /// Capability used when brokkr.yaml names none
    pub default_capability: String,
    /// Descriptor listing entry points for the default capability
    pub descriptor: String,
}

impl ArtifactFormat {
    pub fn current() -> Self {
        Self {
            archive: "tar+gzip".to_string(),
            manifest: MANIFEST_FILENAME.to_string(),
            default_capability: DEFAULT_CAPABILITY.to_string(),
            descriptor: ServiceDescriptorScanner::descriptor_path(DEFAULT_CAPABILITY),
        }
    }
}

impl VersionInfo {
    /// Create version info for current build
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("GIT_SHA").map(String::from),
            target: option_env!("TARGET").map(String::from),
            artifact: ArtifactFormat::current(),
        }
    }

    /// One-line build summary
    pub fn display(&self) -> String {
        let mut parts = vec![format!("brokkr {}", self.version)];

        if let Some(commit) = &self.commit {
            parts.push(format!("({})", commit));
        }

        if let Some(target) = &self.target {
            parts.push(target.clone());
        }

        parts.join(" ")
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
