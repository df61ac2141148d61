//! Dependency closure checking
//!
//! A module's dependencies are met when every declared dependency is
//! installed, active, inside the declared version range, has its own
//! dependencies met and has a valid artifact. Closures found to be met are
//! remembered for the rest of the pass; failed ones are re-checked.

use crate::artifact::{fetch_content, lookup_artifact, ArtifactValidator};
use crate::context::{ModuleRef, ResolutionContext};
use crate::error::ResolutionError;
use crate::manifest::ManifestValidator;
use crate::registry::ModuleRegistry;
use crate::store::ArtifactStore;
use crate::unit;
use brokkr_core::types::InstalledModule;
use brokkr_core::VersionRange;
use tracing::debug;

/// A declared dependency, after the manifest was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub name: String,
    pub range: String,
}

/// Checks dependency closures within one resolution pass
pub struct DependencyResolver<'a> {
    pub(crate) registry: &'a dyn ModuleRegistry,
    pub(crate) store: &'a dyn ArtifactStore,
    pub(crate) artifacts: ArtifactValidator<'a>,
}

impl<'a> DependencyResolver<'a> {
    /// The artifact validator dependencies are validated with
    pub fn artifacts(&self) -> &ArtifactValidator<'a> {
        &self.artifacts
    }

    /// Check the transitive dependency closure of `module`
    pub fn dependencies_met(
        &self,
        ctx: &mut ResolutionContext,
        module: &ModuleRef,
    ) -> Result<(), ResolutionError> {
        if ctx.is_closure_validated(&module.name) {
            return Ok(());
        }

        ctx.enter(module)?;
        let result = self.check_closure(ctx, module);
        ctx.leave(&module.id);

        if result.is_ok() {
            ctx.mark_closure_validated(&module.name);
            debug!(module = %module.name, "Dependency closure satisfied");
        }
        result
    }

    /// Dependencies declared by the manifest inside the module's artifact
    ///
    /// The manifest is only parsed here; validating it is the artifact
    /// validator's job.
    pub fn declared_dependencies(
        &self,
        module: &ModuleRef,
    ) -> Result<Vec<DeclaredDependency>, ResolutionError> {
        let artifact = lookup_artifact(self.registry, &module.id)?;
        let content = fetch_content(self.store, &artifact)?;

        let bytes = unit::read_manifest(&content)
            .map_err(|e| ResolutionError::unavailable(&module.name, format!("{:#}", e)))?
            .ok_or_else(|| ResolutionError::ManifestParseFailure {
                module: module.name.clone(),
                message: "artifact has no module.yml".to_string(),
            })?;
        let manifest = ManifestValidator::parse(&bytes).map_err(|e| e.for_module(&module.name))?;

        manifest
            .dependencies
            .into_iter()
            .enumerate()
            .map(|(i, dep)| match (dep.name, dep.version) {
                (Some(name), Some(range)) => Ok(DeclaredDependency { name, range }),
                _ => Err(ResolutionError::ManifestParseFailure {
                    module: module.name.clone(),
                    message: format!("dependency #{} needs both a name and a version", i + 1),
                }),
            })
            .collect()
    }

    fn check_closure(
        &self,
        ctx: &mut ResolutionContext,
        module: &ModuleRef,
    ) -> Result<(), ResolutionError> {
        let declared = self.declared_dependencies(module)?;

        let mut candidates = Vec::with_capacity(declared.len());
        let mut failures = Vec::new();
        for dep in &declared {
            match self.installed_candidate(module, dep) {
                Ok(candidate) => candidates.push((dep, candidate)),
                Err(e) => {
                    debug!(module = %module.name, dependency = %dep.name, "{}", e);
                    failures.push(e);
                }
            }
        }
        if let Some(first) = failures.into_iter().next() {
            return Err(first);
        }

        for (dep, candidate) in candidates {
            let candidate_ref = ModuleRef::new(&candidate.id, &candidate.name);
            self.dependencies_met(ctx, &candidate_ref)
                .and_then(|()| self.artifacts.validate(ctx, &candidate.id))
                .map_err(|cause| ResolutionError::DependencyUnresolved {
                    module: module.name.clone(),
                    dependency: dep.name.clone(),
                    cause: Box::new(cause),
                })?;
        }

        Ok(())
    }

    /// Presence, activity and version checks for one dependency
    fn installed_candidate(
        &self,
        module: &ModuleRef,
        dep: &DeclaredDependency,
    ) -> Result<InstalledModule, ResolutionError> {
        let candidate = self
            .registry
            .find_by_name(&dep.name)
            .map_err(|e| ResolutionError::registry(&dep.name, &e))?
            .ok_or_else(|| ResolutionError::DependencyNotInstalled {
                module: module.name.clone(),
                dependency: dep.name.clone(),
            })?;

        if !candidate.active {
            return Err(ResolutionError::DependencyInactive {
                module: module.name.clone(),
                dependency: dep.name.clone(),
            });
        }

        let unsatisfied = |installed: String| ResolutionError::VersionConstraintUnsatisfied {
            module: module.name.clone(),
            dependency: dep.name.clone(),
            required: dep.range.clone(),
            installed,
        };

        let installed = &candidate.installed_version;
        let satisfied = VersionRange::parse(&dep.range)
            .and_then(|range| range.matches_str(installed))
            .map_err(|e| unsatisfied(format!("{} ({})", installed, e)))?;

        if !satisfied {
            return Err(unsatisfied(installed.clone()));
        }

        Ok(candidate)
    }
}
