//! Module manifest (module.yml) validation
//!
//! Validation runs in two stages: the parsed manifest is first checked
//! against the embedded `module` JSON Schema, then against rules the schema
//! cannot express (semantic version, parsable dependency ranges, no
//! self-dependency).

use crate::error::ResolutionError;
use brokkr_core::types::ModuleManifest;
use brokkr_core::{SchemaValidator, VersionRange};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a manifest was rejected, before it is attributed to a module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("{0}")]
    Parse(String),

    #[error("{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

impl ManifestError {
    /// Attribute the failure to `module`
    pub fn for_module(self, module: &str) -> ResolutionError {
        match self {
            Self::Parse(message) => ResolutionError::ManifestParseFailure {
                module: module.to_string(),
                message,
            },
            Self::Invalid(errors) => ResolutionError::SchemaValidationFailure {
                module: module.to_string(),
                errors,
            },
        }
    }
}

/// Validates manifests against the embedded `module` schema
#[derive(Debug)]
pub struct ManifestValidator {
    schemas: SchemaValidator,
}

impl ManifestValidator {
    /// Create a validator backed by the embedded schemas
    pub fn new() -> brokkr_core::Result<Self> {
        Ok(Self::with_schemas(SchemaValidator::new()?))
    }

    pub fn with_schemas(schemas: SchemaValidator) -> Self {
        Self { schemas }
    }

    /// Parse manifest bytes without validating them
    pub fn parse(bytes: &[u8]) -> Result<ModuleManifest, ManifestError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ManifestError::Parse(format!("manifest is not valid UTF-8: {}", e)))?;

        if text.trim().is_empty() {
            return Err(ManifestError::Parse("manifest is empty".to_string()));
        }

        serde_yaml_ng::from_str(text).map_err(|e| ManifestError::Parse(e.to_string()))
    }

    /// Parse and fully validate manifest bytes
    pub fn validate(&self, bytes: &[u8]) -> Result<ModuleManifest, ManifestError> {
        let manifest = Self::parse(bytes)?;
        self.check(&manifest)?;
        Ok(manifest)
    }

    /// Validate a module.yml on disk
    pub fn validate_file(&self, path: &Path) -> Result<ModuleManifest, ManifestError> {
        let bytes = std::fs::read(path).map_err(|e| {
            ManifestError::Parse(format!("failed to read {}: {}", path.display(), e))
        })?;
        self.validate(&bytes)
    }

    /// Check an already parsed manifest
    pub fn check(&self, manifest: &ModuleManifest) -> Result<(), ManifestError> {
        let value = serde_json::to_value(manifest)
            .map_err(|e| ManifestError::Parse(format!("failed to serialize manifest: {}", e)))?;

        let errors = self
            .schemas
            .errors(&value, "module")
            .map_err(|e| ManifestError::Parse(e.to_string()))?;
        if !errors.is_empty() {
            debug!("Manifest failed schema validation with {} error(s)", errors.len());
            return Err(ManifestError::Invalid(errors));
        }

        let errors = Self::semantic_errors(manifest);
        if !errors.is_empty() {
            return Err(ManifestError::Invalid(errors));
        }

        Ok(())
    }

    fn semantic_errors(manifest: &ModuleManifest) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(version) = &manifest.version {
            if let Err(e) = semver::Version::parse(version) {
                errors.push(format!(
                    "  - /version: '{}' is not a semantic version: {}",
                    version, e
                ));
            }
        }

        for (i, dep) in manifest.dependencies.iter().enumerate() {
            if let Some(range) = &dep.version {
                if let Err(e) = VersionRange::parse(range) {
                    errors.push(format!("  - /dependencies/{}/version: {}", i, e));
                }
            }
            if dep.name.is_some() && dep.name == manifest.name {
                errors.push(format!(
                    "  - /dependencies/{}/name: module cannot depend on itself",
                    i
                ));
            }
        }

        errors
    }
}
