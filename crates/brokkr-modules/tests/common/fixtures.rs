//! Test environment: registry, store, manifest validator and a module root

#![allow(dead_code)]

use super::builders::ModuleBuilder;
use brokkr_modules::{
    ManifestValidator, MemoryArtifactStore, MemoryRegistry, ResolutionPipeline,
    ResolutionReport, RuntimeLayout,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// In-memory registry and store rooted in a temporary module directory
pub struct TestEnv {
    dir: TempDir,
    pub registry: MemoryRegistry,
    pub store: MemoryArtifactStore,
    pub manifests: ManifestValidator,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("scratch")).unwrap();
        Self {
            dir,
            registry: MemoryRegistry::new(),
            store: MemoryArtifactStore::new(),
            manifests: ManifestValidator::new().unwrap(),
        }
    }

    /// Environment with `modules` installed in order
    pub fn with_modules(modules: &[ModuleBuilder]) -> Self {
        let env = Self::new();
        for module in modules {
            env.install(module);
        }
        env
    }

    /// Register `module` and make its artifact available
    pub fn install(&self, module: &ModuleBuilder) {
        let artifact = module.artifact();
        if module.is_inline() {
            self.registry
                .insert_with_content(module.record(), module.base_package(), artifact)
                .unwrap();
        } else {
            self.store.insert(module.artifact_ref(), artifact).unwrap();
            self.registry
                .insert(module.record(), module.base_package())
                .unwrap();
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn module_root(&self) -> PathBuf {
        self.dir.path().join("modules")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    pub fn layout(&self) -> RuntimeLayout {
        RuntimeLayout::new(self.module_root())
    }

    pub fn pipeline(&self) -> ResolutionPipeline<'_> {
        ResolutionPipeline::new(&self.registry, &self.store, &self.manifests, self.layout())
            .with_scratch_dir(self.scratch_dir())
    }

    pub fn resolve(&self) -> ResolutionReport {
        self.pipeline().resolve()
    }

    /// Path an artifact is extracted to
    pub fn runtime_file(&self, artifact_ref: &str) -> PathBuf {
        self.layout().extraction_path(artifact_ref).unwrap()
    }

    pub fn scratch_is_empty(&self) -> bool {
        fs::read_dir(self.scratch_dir()).unwrap().next().is_none()
    }
}
