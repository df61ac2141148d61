//! Artifact packing
//!
//! Builds gzip-compressed tar archives in the layout the artifact validator
//! reads. Entries are written in path order with fixed metadata, so packing
//! the same inputs twice yields the same bytes.

use crate::scanner::ServiceDescriptorScanner;
use anyhow::{Context, Result};
use brokkr_core::types::{ModuleManifest, MANIFEST_FILENAME};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tar::{Builder, Header};
use tracing::debug;
use walkdir::WalkDir;

/// Builder for module artifacts
#[derive(Debug, Clone, Default)]
pub struct ArtifactPacker {
    entries: BTreeMap<String, Vec<u8>>,
}

impl ArtifactPacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every file below `dir`, keyed by its relative path
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut packer = Self::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(dir)
                .context("Walked outside of the source directory")?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let data = fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            packer.entries.insert(name, data);
        }

        debug!(
            "Collected {} file(s) from {}",
            packer.entries.len(),
            dir.display()
        );
        Ok(packer)
    }

    /// Add or replace a file
    pub fn file(mut self, path: impl Into<String>, data: impl AsRef<[u8]>) -> Self {
        self.entries.insert(path.into(), data.as_ref().to_vec());
        self
    }

    /// Serialize `manifest` as module.yml
    pub fn manifest(self, manifest: &ModuleManifest) -> Result<Self> {
        let yaml = serde_yaml_ng::to_string(manifest).context("Failed to serialize manifest")?;
        Ok(self.file(MANIFEST_FILENAME, yaml))
    }

    /// Write the capability descriptor listing `identifiers`
    pub fn entry_points<S: AsRef<str>>(self, capability: &str, identifiers: &[S]) -> Self {
        let mut descriptor = String::new();
        for id in identifiers {
            descriptor.push_str(id.as_ref());
            descriptor.push('\n');
        }
        self.file(ServiceDescriptorScanner::descriptor_path(capability), descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the archive bytes
    pub fn finish(self) -> Result<Vec<u8>> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(encoder);

        for (path, data) in &self.entries {
            let mut header = Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(0);
            builder
                .append_data(&mut header, path, data.as_slice())
                .with_context(|| format!("Failed to add {} to archive", path))?;
        }

        let encoder = builder.into_inner().context("Failed to finish archive")?;
        encoder.finish().context("Failed to compress archive")
    }

    /// Produce the archive and write it to `path`
    pub fn write_to(self, path: &Path) -> Result<u64> {
        let bytes = self.finish()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::LoadableUnit;

    #[test]
    fn test_packing_is_deterministic() {
        let build = || {
            ArtifactPacker::new()
                .file("b.txt", "b")
                .file("a.txt", "a")
                .entry_points("brokkr.ModuleEntryPoint", &["org.x.Module"])
                .finish()
                .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_from_dir_uses_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("META-INF/services")).unwrap();
        fs::write(dir.path().join("module.yml"), "name: x\nversion: 1.0.0\n").unwrap();
        fs::write(
            dir.path().join("META-INF/services/brokkr.ModuleEntryPoint"),
            "org.x.Module\n",
        )
        .unwrap();

        let packer = ArtifactPacker::from_dir(dir.path()).unwrap();
        assert_eq!(packer.len(), 2);

        let unit = LoadableUnit::open(&packer.finish().unwrap(), None).unwrap();
        assert_eq!(
            unit.paths().collect::<Vec<_>>(),
            vec!["META-INF/services/brokkr.ModuleEntryPoint", "module.yml"]
        );
    }

    #[test]
    fn test_manifest_round_trips_through_unit() {
        let manifest = ModuleManifest {
            name: Some("core".into()),
            version: Some("1.0.0".into()),
            ..Default::default()
        };
        let bytes = ArtifactPacker::new().manifest(&manifest).unwrap().finish().unwrap();
        let unit = LoadableUnit::open(&bytes, None).unwrap();

        let text = std::str::from_utf8(unit.manifest().unwrap()).unwrap();
        let parsed: ModuleManifest = serde_yaml_ng::from_str(text).unwrap();
        assert_eq!(parsed, manifest);
    }
}
