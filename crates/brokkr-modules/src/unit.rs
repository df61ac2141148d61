//! Loadable units: module artifacts opened for inspection
//!
//! An artifact is a gzip-compressed tar archive with `module.yml` at its
//! root. Opening a unit copies the binary to a scratch file and reads the
//! archive from there; the scratch file is removed when the unit is dropped.

use anyhow::{Context, Result};
use brokkr_core::types::MANIFEST_FILENAME;
use flate2::read::GzDecoder;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tar::Archive;
use tempfile::NamedTempFile;

/// An opened module artifact
#[derive(Debug)]
pub struct LoadableUnit {
    scratch: NamedTempFile,
    entries: Vec<UnitEntry>,
}

#[derive(Debug)]
struct UnitEntry {
    path: String,
    data: Vec<u8>,
}

impl LoadableUnit {
    /// Copy `content` to scratch storage and open it
    ///
    /// The scratch file is created in `scratch_dir`, or in the system
    /// temporary directory when none is given.
    pub fn open(content: &[u8], scratch_dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("brokkr-unit-").suffix(".tgz");
        let mut scratch = match scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("Failed to create scratch file")?;

        scratch
            .write_all(content)
            .and_then(|_| scratch.flush())
            .context("Failed to write scratch file")?;

        let file = scratch.reopen().context("Failed to reopen scratch file")?;
        let entries = read_entries(BufReader::new(file))?;

        Ok(Self { scratch, entries })
    }

    /// Contents of the file at `path`, if the archive has one
    pub fn read(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.data.as_slice())
    }

    pub fn manifest(&self) -> Option<&[u8]> {
        self.read(MANIFEST_FILENAME)
    }

    /// File paths in archive order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }
}

/// Read `module.yml` straight from artifact bytes, without scratch storage
pub fn read_manifest(content: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(read_entries(content)?
        .into_iter()
        .find(|e| e.path == MANIFEST_FILENAME)
        .map(|e| e.data))
}

fn read_entries<R: Read>(reader: R) -> Result<Vec<UnitEntry>> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut entries = Vec::new();

    for entry in archive
        .entries()
        .context("Artifact is not a readable module archive")?
    {
        let mut entry = entry.context("Artifact is not a readable module archive")?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = normalize_entry_path(&entry.path()?.to_string_lossy());
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .with_context(|| format!("Failed to read {} from artifact", path))?;
        entries.push(UnitEntry { path, data });
    }

    Ok(entries)
}

fn normalize_entry_path(path: &str) -> String {
    path.replace('\\', "/")
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::ArtifactPacker;

    fn sample() -> Vec<u8> {
        ArtifactPacker::new()
            .file(MANIFEST_FILENAME, "name: core\nversion: 1.0.0\n")
            .file("lib/core.txt", "payload")
            .finish()
            .unwrap()
    }

    #[test]
    fn test_open_reads_entries() {
        let unit = LoadableUnit::open(&sample(), None).unwrap();
        assert_eq!(unit.paths().collect::<Vec<_>>(), vec!["lib/core.txt", "module.yml"]);
        assert_eq!(unit.read("lib/core.txt"), Some(&b"payload"[..]));
        assert!(unit.manifest().is_some());
    }

    #[test]
    fn test_scratch_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let unit = LoadableUnit::open(&sample(), Some(dir.path())).unwrap();
        let scratch = unit.scratch_path().to_path_buf();
        assert!(scratch.exists());

        drop(unit);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LoadableUnit::open(b"not an archive", Some(dir.path())).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_read_manifest_in_memory() {
        let manifest = read_manifest(&sample()).unwrap().unwrap();
        assert_eq!(manifest, b"name: core\nversion: 1.0.0\n");
    }

    #[test]
    fn test_normalize_entry_path() {
        assert_eq!(normalize_entry_path("./module.yml"), "module.yml");
        assert_eq!(normalize_entry_path("META-INF\\services\\x"), "META-INF/services/x");
    }
}
