//! Artifact validation
//!
//! An artifact is valid when it declares exactly one entry point for the
//! configured capability and carries a schema-valid manifest. Valid artifacts
//! are written to the runtime location and their entry point is recorded in
//! the [`ResolutionContext`].

use crate::context::{Extraction, ResolutionContext};
use crate::error::ResolutionError;
use crate::layout::RuntimeLayout;
use crate::manifest::{ManifestError, ManifestValidator};
use crate::registry::ModuleRegistry;
use crate::scanner::EntryPointScanner;
use crate::store::ArtifactStore;
use crate::unit::LoadableUnit;
use brokkr_core::types::{ModuleArtifact, ModuleManifest};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Validates module artifacts within one resolution pass
pub struct ArtifactValidator<'a> {
    pub(crate) registry: &'a dyn ModuleRegistry,
    pub(crate) store: &'a dyn ArtifactStore,
    pub(crate) manifests: &'a ManifestValidator,
    pub(crate) scanner: &'a dyn EntryPointScanner,
    pub(crate) layout: &'a RuntimeLayout,
    pub(crate) capability: &'a str,
    pub(crate) scratch_dir: Option<&'a Path>,
}

impl ArtifactValidator<'_> {
    /// Validate the artifact of the module with registry identity `module_id`
    ///
    /// An artifact name already validated in this pass is accepted without
    /// touching the store or the runtime location.
    pub fn validate(
        &self,
        ctx: &mut ResolutionContext,
        module_id: &str,
    ) -> Result<(), ResolutionError> {
        let artifact = lookup_artifact(self.registry, module_id)?;

        if ctx.is_artifact_validated(&artifact.name) {
            debug!(module = %artifact.name, "Artifact already validated in this pass");
            return Ok(());
        }

        let content = fetch_content(self.store, &artifact)?;

        let entry_point = {
            let unit = LoadableUnit::open(&content, self.scratch_dir)
                .map_err(|e| ResolutionError::unavailable(&artifact.name, format!("{:#}", e)))?;

            let entry_point = self.select_entry_point(ctx, &artifact, &unit)?;

            let manifest = unit.manifest().ok_or_else(|| {
                ManifestError::Parse("artifact has no module.yml".to_string())
                    .for_module(&artifact.name)
            })?;
            self.manifests
                .validate(manifest)
                .map_err(|e| e.for_module(&artifact.name))?;

            entry_point
        };

        let extraction = self.extract(&artifact, &content)?;

        ctx.record_entry_point(module_id, &entry_point);
        ctx.mark_artifact_validated(&artifact.name);
        ctx.record_extraction(extraction);

        info!(
            module = %artifact.name,
            entry_point = %entry_point,
            "Artifact validated"
        );
        Ok(())
    }

    fn select_entry_point(
        &self,
        ctx: &mut ResolutionContext,
        artifact: &ModuleArtifact,
        unit: &LoadableUnit,
    ) -> Result<String, ResolutionError> {
        let mut found = self
            .scanner
            .scan(unit, self.capability, artifact.base_package.as_deref())
            .into_iter();

        let chosen = found.next().ok_or_else(|| ResolutionError::NoEntryPointFound {
            module: artifact.name.clone(),
            capability: self.capability.to_string(),
        })?;

        let ignored: Vec<String> = found.collect();
        if !ignored.is_empty() {
            let warning = ResolutionError::MultipleEntryPointsAmbiguity {
                module: artifact.name.clone(),
                chosen: chosen.clone(),
                ignored,
            };
            warn!("{}", warning);
            ctx.warn(warning);
        }

        Ok(chosen)
    }

    fn extract(
        &self,
        artifact: &ModuleArtifact,
        content: &[u8],
    ) -> Result<Extraction, ResolutionError> {
        let failure = |path: &str, message: String| ResolutionError::ExtractionFailure {
            module: artifact.name.clone(),
            path: path.to_string(),
            message,
        };

        let path = self
            .layout
            .extraction_path(&artifact.artifact_ref)
            .map_err(|e| failure(&artifact.artifact_ref, e.to_string()))?;
        let shown = path.display().to_string();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| failure(&shown, e.to_string()))?;
        }
        fs::write(&path, content).map_err(|e| failure(&shown, e.to_string()))?;

        debug!(module = %artifact.name, "Extracted artifact to {}", shown);

        Ok(Extraction {
            module: artifact.name.clone(),
            path,
            bytes: content.len() as u64,
            sha256: sha256_hex(content),
        })
    }
}

/// Registry metadata of a module's artifact
pub(crate) fn lookup_artifact(
    registry: &dyn ModuleRegistry,
    module_id: &str,
) -> Result<ModuleArtifact, ResolutionError> {
    registry
        .find_artifact(module_id)
        .map_err(|e| ResolutionError::registry(module_id, &e))?
        .ok_or_else(|| ResolutionError::unavailable(module_id, "no artifact registered"))
}

/// Binary content of an artifact, from the registry record or the store
pub(crate) fn fetch_content<'a>(
    store: &dyn ArtifactStore,
    artifact: &'a ModuleArtifact,
) -> Result<Cow<'a, [u8]>, ResolutionError> {
    match &artifact.content {
        Some(content) => Ok(Cow::Borrowed(content.as_slice())),
        None => store
            .fetch_binary(&artifact.artifact_ref)
            .map(Cow::Owned)
            .map_err(|e| ResolutionError::unavailable(&artifact.name, format!("{:#}", e))),
    }
}

pub(crate) fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// What an artifact contains, for display
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInspection {
    pub files: Vec<String>,
    pub entry_points: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ModuleManifest>,
    /// Why the manifest is missing or invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_error: Option<String>,
    pub sha256: String,
}

impl ArtifactInspection {
    /// Open `content` and report its files, entry points and manifest
    pub fn inspect(
        content: &[u8],
        capability: &str,
        scanner: &dyn EntryPointScanner,
        manifests: &ManifestValidator,
    ) -> anyhow::Result<Self> {
        let unit = LoadableUnit::open(content, None)?;

        let (manifest, manifest_error) = match unit.manifest() {
            None => (None, Some("artifact has no module.yml".to_string())),
            Some(bytes) => match ManifestValidator::parse(bytes) {
                Err(e) => (None, Some(e.to_string())),
                Ok(manifest) => {
                    let error = manifests.check(&manifest).err().map(|e| e.to_string());
                    (Some(manifest), error)
                }
            },
        };

        let base_package = manifest.as_ref().and_then(|m| m.base_package.clone());
        let entry_points = scanner.scan(&unit, capability, base_package.as_deref());

        Ok(Self {
            files: unit.paths().map(str::to_string).collect(),
            entry_points,
            manifest,
            manifest_error,
            sha256: sha256_hex(content),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.manifest_error.is_none() && self.entry_points.len() == 1
    }
}
