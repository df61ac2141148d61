//! Artifact store: where packaged module binaries live

use crate::layout::normalize_artifact_ref;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of artifact binaries, addressed by artifact reference
pub trait ArtifactStore {
    fn fetch_binary(&self, artifact_ref: &str) -> Result<Vec<u8>>;
}

/// Artifact store backed by a directory
///
/// References are resolved below the root; references that are absolute or
/// climb out of the root are refused.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, artifact_ref: &str) -> Result<PathBuf> {
        Ok(self.root.join(normalize_artifact_ref(artifact_ref)?))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn fetch_binary(&self, artifact_ref: &str) -> Result<Vec<u8>> {
        let path = self.path_of(artifact_ref)?;
        debug!("Fetching artifact {} from {}", artifact_ref, path.display());
        fs::read(&path).with_context(|| format!("Failed to read artifact {}", path.display()))
    }
}
