//! Module registry and manifest types

use serde::{Deserialize, Serialize};

/// Name of the manifest file at the root of every artifact
pub const MANIFEST_FILENAME: &str = "module.yml";

/// A module as recorded in the registry
///
/// Records are owned by the registry; resolution only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    /// Registry identity
    pub id: String,

    /// Module name
    pub name: String,

    /// Installed version
    pub version: String,

    /// Reference of the packaged artifact in the artifact store
    #[serde(rename = "artifact")]
    pub artifact_ref: String,

    /// Whether the module is enabled
    #[serde(default)]
    pub active: bool,

    /// Whether the module was uninstalled (rows are kept for history)
    #[serde(default, rename = "uninstall")]
    pub uninstalled: bool,

    /// Set by the host once the module has been started
    #[serde(default)]
    pub started: bool,
}

/// Answer to a registry lookup by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledModule {
    pub id: String,
    pub name: String,
    pub installed_version: String,
    pub active: bool,
}

/// Packaged artifact of a module
///
/// `content` is `None` when the registry does not carry the binary inline; it
/// is then fetched from the artifact store on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleArtifact {
    /// Module name the artifact belongs to
    pub name: String,

    /// Package that holds the entry point, if the registry knows it
    pub base_package: Option<String>,

    /// Reference in the artifact store
    pub artifact_ref: String,

    /// Binary content
    pub content: Option<Vec<u8>>,
}

/// Declarative module description (module.yml)
///
/// Identity fields are optional at the type level so that a manifest with a
/// missing `name` or `version` still parses and is rejected by schema
/// validation with a precise message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_package: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Whether the module is listed in the module store
    #[serde(default = "default_store")]
    pub store: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ManifestDependency>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
}

fn default_store() -> bool {
    true
}

impl Default for ModuleManifest {
    fn default() -> Self {
        Self {
            name: None,
            base_package: None,
            version: None,
            store: default_store(),
            summary: None,
            dependencies: Vec::new(),
            permissions: Vec::new(),
            roles: Vec::new(),
        }
    }
}

/// Dependency on another module, by name and version range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Version range, e.g. `^1.0.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ManifestDependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
        }
    }
}

/// Permission contributed by a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Role contributed by a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}
