//! On-disk layout below the module root

use anyhow::{bail, Result};
use std::path::{Component, Path, PathBuf};

/// Directory below the module root that holds extracted artifacts
pub const RUNTIME_DIR: &str = "runtime";

/// Lock file guarding a resolution pass, kept beside the runtime directory
/// so no artifact reference can land on it
pub const LOCK_FILE: &str = ".resolution.lock";

/// Paths derived from the module root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeLayout {
    module_root: PathBuf,
}

impl RuntimeLayout {
    pub fn new(module_root: impl Into<PathBuf>) -> Self {
        Self {
            module_root: module_root.into(),
        }
    }

    pub fn module_root(&self) -> &Path {
        &self.module_root
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.module_root.join(RUNTIME_DIR)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.module_root.join(LOCK_FILE)
    }

    /// Location a validated artifact is written to
    ///
    /// `<module-root>/runtime/<artifact_ref>`, with `\` in the reference
    /// treated as a path separator.
    pub fn extraction_path(&self, artifact_ref: &str) -> Result<PathBuf> {
        Ok(self.runtime_dir().join(normalize_artifact_ref(artifact_ref)?))
    }
}

/// Turn an artifact reference into a relative path
///
/// Backslashes become separators and `.` segments are dropped. Empty
/// references, absolute references and references that climb out of their
/// root with `..` are rejected.
pub fn normalize_artifact_ref(artifact_ref: &str) -> Result<PathBuf> {
    let unified = artifact_ref.trim().replace('\\', "/");

    if unified.is_empty() {
        bail!("Artifact reference is empty");
    }
    if unified.starts_with('/') || has_drive_prefix(&unified) {
        bail!("Artifact reference must be relative: {}", artifact_ref);
    }

    let mut path = PathBuf::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => bail!("Artifact reference escapes its root: {}", artifact_ref),
        }
    }

    if path.as_os_str().is_empty() {
        bail!("Artifact reference has no file name: {}", artifact_ref);
    }

    Ok(path)
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("core.tgz", "core.tgz" ; "plain file")]
    #[test_case("core/core-1.0.0.tgz", "core/core-1.0.0.tgz" ; "nested")]
    #[test_case("core\\core-1.0.0.tgz", "core/core-1.0.0.tgz" ; "backslashes")]
    #[test_case("./core/./a.tgz", "core/a.tgz" ; "current dir segments")]
    fn test_normalize_accepts(input: &str, expected: &str) {
        assert_eq!(normalize_artifact_ref(input).unwrap(), PathBuf::from(expected));
    }

    #[test_case("" ; "empty")]
    #[test_case("/etc/passwd" ; "absolute")]
    #[test_case("C:\\modules\\a.tgz" ; "drive letter")]
    #[test_case("../outside.tgz" ; "parent")]
    #[test_case("core\\..\\..\\x.tgz" ; "parent via backslashes")]
    #[test_case("." ; "no file name")]
    fn test_normalize_rejects(input: &str) {
        assert!(normalize_artifact_ref(input).is_err());
    }

    #[test]
    fn test_extraction_path() {
        let layout = RuntimeLayout::new("/srv/modules");
        assert_eq!(
            layout.extraction_path("reports\\reports.tgz").unwrap(),
            PathBuf::from("/srv/modules/runtime/reports/reports.tgz")
        );
        assert_eq!(
            layout.lock_path(),
            PathBuf::from("/srv/modules/.resolution.lock")
        );
    }

    #[test]
    fn test_lock_is_outside_extraction_namespace() {
        let layout = RuntimeLayout::new("/srv/modules");
        let extracted = layout.extraction_path(LOCK_FILE).unwrap();
        assert_ne!(extracted, layout.lock_path());
        assert!(!layout.lock_path().starts_with(layout.runtime_dir()));
    }
}
