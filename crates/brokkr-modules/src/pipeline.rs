//! Resolution pipeline: one pass over the registry

use crate::artifact::ArtifactValidator;
use crate::context::{ModuleRef, ResolutionContext};
use crate::dependency::DependencyResolver;
use crate::error::ResolutionError;
use crate::layout::RuntimeLayout;
use crate::manifest::ManifestValidator;
use crate::registry::ModuleRegistry;
use crate::report::{ModuleOutcome, ResolutionReport};
use crate::scanner::{EntryPointScanner, ServiceDescriptorScanner};
use crate::store::ArtifactStore;
use brokkr_core::types::DEFAULT_CAPABILITY;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Resolves the active modules of a registry
pub struct ResolutionPipeline<'a> {
    registry: &'a dyn ModuleRegistry,
    store: &'a dyn ArtifactStore,
    manifests: &'a ManifestValidator,
    scanner: Box<dyn EntryPointScanner>,
    layout: RuntimeLayout,
    capability: String,
    scratch_dir: Option<PathBuf>,
}

impl<'a> ResolutionPipeline<'a> {
    pub fn new(
        registry: &'a dyn ModuleRegistry,
        store: &'a dyn ArtifactStore,
        manifests: &'a ManifestValidator,
        layout: RuntimeLayout,
    ) -> Self {
        Self {
            registry,
            store,
            manifests,
            scanner: Box::new(ServiceDescriptorScanner),
            layout,
            capability: DEFAULT_CAPABILITY.to_string(),
            scratch_dir: None,
        }
    }

    pub fn with_scanner(mut self, scanner: impl EntryPointScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = capability.into();
        self
    }

    /// Directory for scratch copies of artifacts (system temp dir otherwise)
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn layout(&self) -> &RuntimeLayout {
        &self.layout
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn artifact_validator(&self) -> ArtifactValidator<'_> {
        ArtifactValidator {
            registry: self.registry,
            store: self.store,
            manifests: self.manifests,
            scanner: self.scanner.as_ref(),
            layout: &self.layout,
            capability: &self.capability,
            scratch_dir: self.scratch_dir.as_deref(),
        }
    }

    pub fn dependency_resolver(&self) -> DependencyResolver<'_> {
        DependencyResolver {
            registry: self.registry,
            store: self.store,
            artifacts: self.artifact_validator(),
        }
    }

    /// Run one resolution pass
    ///
    /// Candidates are the registry's active, not uninstalled modules. A
    /// module is kept when its dependency closure is met and its own artifact
    /// is valid; entry points contributed by rejected modules are purged.
    /// Failures never abort the pass, they are reported.
    pub fn resolve(&self) -> ResolutionReport {
        let started_at = Utc::now();
        let mut ctx = ResolutionContext::new();
        let mut errors = Vec::new();

        if let Err(e) = self.registry.reset_started_flags() {
            warn!("Failed to reset started flags: {:#}", e);
            errors.push(ResolutionError::registry("started flags", &e));
        }

        let candidates = match self.registry.list_active_modules() {
            Ok(modules) => modules,
            Err(e) => {
                warn!("Failed to list active modules: {:#}", e);
                errors.push(ResolutionError::registry("active modules", &e));
                Vec::new()
            }
        };
        info!("Resolving {} active module(s)", candidates.len());

        let resolver = self.dependency_resolver();
        let mut outcomes = Vec::with_capacity(candidates.len());

        for record in candidates {
            if !record.active || record.uninstalled {
                debug!(module = %record.name, "Skipping inactive module");
                continue;
            }

            let module = ModuleRef::from(&record);
            let result = resolver
                .dependencies_met(&mut ctx, &module)
                .and_then(|()| resolver.artifacts().validate(&mut ctx, &record.id));

            match result {
                Ok(()) => {
                    info!(module = %record.name, version = %record.version, "Module resolved");
                    outcomes.push(ModuleOutcome::resolved(record));
                }
                Err(e) => {
                    let purged = ctx.purge_contributions(&record.id);
                    warn!(module = %record.name, "Module rejected: {}", e);
                    outcomes.push(ModuleOutcome::rejected(record, e, purged));
                }
            }
        }

        let (entry_points, warnings, extractions) = ctx.into_parts();
        let report = ResolutionReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
            errors,
            warnings,
            entry_points,
            extractions,
        };

        info!(
            "Resolution finished: {} resolved, {} rejected",
            report.resolved().len(),
            report.rejected().count()
        );
        report
    }
}
