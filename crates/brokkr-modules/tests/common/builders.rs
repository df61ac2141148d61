//! Module builders for creating test fixtures
//!
//! A [`ModuleBuilder`] describes one installed module: the registry record
//! and the artifact it points to.

#![allow(dead_code)]

use brokkr_core::types::{ModuleRecord, DEFAULT_CAPABILITY, MANIFEST_FILENAME};
use brokkr_modules::ArtifactPacker;

/// Builder for an installed module and its artifact
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    id: String,
    name: String,
    version: String,
    artifact_ref: String,
    base_package: Option<String>,
    dependencies: Vec<(String, String)>,
    entry_points: Vec<String>,
    manifest: Option<String>,
    active: bool,
    uninstalled: bool,
    inline: bool,
}

impl ModuleBuilder {
    /// Module `name` at version 1.0.0 with one entry point
    pub fn new(name: &str) -> Self {
        Self {
            id: format!("id-{}", name.to_lowercase()),
            name: name.to_string(),
            version: "1.0.0".to_string(),
            artifact_ref: format!("{}/{}-1.0.0.tgz", name.to_lowercase(), name.to_lowercase()),
            base_package: None,
            dependencies: Vec::new(),
            entry_points: vec![entry_point_of(name)],
            manifest: None,
            active: true,
            uninstalled: false,
            inline: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_artifact_ref(mut self, artifact_ref: &str) -> Self {
        self.artifact_ref = artifact_ref.to_string();
        self
    }

    pub fn with_base_package(mut self, base_package: &str) -> Self {
        self.base_package = Some(base_package.to_string());
        self
    }

    pub fn depends_on(mut self, name: &str, range: &str) -> Self {
        self.dependencies.push((name.to_string(), range.to_string()));
        self
    }

    pub fn with_entry_points(mut self, entry_points: &[&str]) -> Self {
        self.entry_points = entry_points.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn without_entry_points(self) -> Self {
        self.with_entry_points(&[])
    }

    /// Replace the generated module.yml with `yaml`
    pub fn with_manifest(mut self, yaml: &str) -> Self {
        self.manifest = Some(yaml.to_string());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn uninstalled(mut self) -> Self {
        self.uninstalled = true;
        self
    }

    /// Carry the artifact in the registry record instead of the store
    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn artifact_ref(&self) -> &str {
        &self.artifact_ref
    }

    pub fn base_package(&self) -> Option<String> {
        self.base_package.clone()
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    pub fn record(&self) -> ModuleRecord {
        ModuleRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            artifact_ref: self.artifact_ref.clone(),
            active: self.active,
            uninstalled: self.uninstalled,
            started: true,
        }
    }

    pub fn manifest_yaml(&self) -> String {
        if let Some(manifest) = &self.manifest {
            return manifest.clone();
        }

        let mut yaml = format!("name: {}\nversion: {}\n", self.name, self.version);
        if let Some(base) = &self.base_package {
            yaml.push_str(&format!("basePackage: {}\n", base));
        }
        if !self.dependencies.is_empty() {
            yaml.push_str("dependencies:\n");
            for (name, range) in &self.dependencies {
                yaml.push_str(&format!("  - name: {}\n    version: \"{}\"\n", name, range));
            }
        }
        yaml
    }

    /// Packed artifact bytes
    pub fn artifact(&self) -> Vec<u8> {
        let mut packer = ArtifactPacker::new().file(MANIFEST_FILENAME, self.manifest_yaml());
        if !self.entry_points.is_empty() {
            packer = packer.entry_points(DEFAULT_CAPABILITY, &self.entry_points);
        }
        packer.file("lib/payload.txt", &self.name).finish().unwrap()
    }
}

/// Entry point generated for module `name`
pub fn entry_point_of(name: &str) -> String {
    format!("org.brokkr.{}.{}Module", name.to_lowercase(), name)
}
