//! Startup wiring: configuration to registry, store and a locked pass

use crate::layout::RuntimeLayout;
use crate::loader::{HostRuntime, LoadPlan, LoaderBoundary};
use crate::manifest::ManifestValidator;
use crate::pipeline::ResolutionPipeline;
use crate::registry::{FileModuleRegistry, ModuleRegistry};
use crate::report::ResolutionReport;
use crate::store::{ArtifactStore, FsArtifactStore};
use anyhow::{Context, Result};
use brokkr_core::BrokkrConfig;
use fs4::fs_std::FileExt;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exclusive lock on the runtime directory, held for one pass
///
/// Taking the lock blocks while another pass holds it. The lock is released
/// when the guard is dropped.
#[derive(Debug)]
pub struct PassLock {
    _file: File,
    path: PathBuf,
}

impl PassLock {
    pub fn acquire(layout: &RuntimeLayout) -> Result<Self> {
        let runtime = layout.runtime_dir();
        fs::create_dir_all(&runtime)
            .with_context(|| format!("Failed to create {}", runtime.display()))?;

        let path = layout.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        file.lock_exclusive()
            .context("Failed to acquire exclusive lock on resolution pass")?;
        debug!("Acquired resolution lock {}", path.display());

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Report and load plan of a bootstrap run
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapOutcome {
    pub report: ResolutionReport,
    pub plan: LoadPlan,
}

/// Everything needed to resolve modules at host startup
pub struct Bootstrap {
    config: BrokkrConfig,
    registry: Box<dyn ModuleRegistry>,
    store: Box<dyn ArtifactStore>,
    manifests: ManifestValidator,
    scratch_dir: Option<PathBuf>,
}

impl Bootstrap {
    /// File registry and directory store at the configured locations
    pub fn from_config(config: BrokkrConfig) -> Result<Self> {
        let registry = FileModuleRegistry::open(config.registry_path().into_std_path_buf())?;
        let store = FsArtifactStore::new(config.store_root().into_std_path_buf());
        Self::new(config, Box::new(registry), Box::new(store))
    }

    pub fn new(
        config: BrokkrConfig,
        registry: Box<dyn ModuleRegistry>,
        store: Box<dyn ArtifactStore>,
    ) -> Result<Self> {
        let manifests = ManifestValidator::new().context("Failed to load manifest schema")?;
        Ok(Self {
            config,
            registry,
            store,
            manifests,
            scratch_dir: None,
        })
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &BrokkrConfig {
        &self.config
    }

    pub fn layout(&self) -> RuntimeLayout {
        RuntimeLayout::new(self.config.module_root().into_std_path_buf())
    }

    /// Run one locked resolution pass and hand the result to `host`
    pub fn run(&self, host: &mut dyn HostRuntime) -> Result<BootstrapOutcome> {
        let layout = self.layout();
        let _lock = PassLock::acquire(&layout)?;

        let mut pipeline = ResolutionPipeline::new(
            self.registry.as_ref(),
            self.store.as_ref(),
            &self.manifests,
            layout.clone(),
        )
        .with_capability(self.config.capability());
        if let Some(dir) = &self.scratch_dir {
            pipeline = pipeline.with_scratch_dir(dir.clone());
        }

        let report = pipeline.resolve();
        let plan = LoaderBoundary::new(&layout).hand_off(&report, host);

        info!(
            "Bootstrap complete: {} module(s) resolved, {} entry point(s) handed off",
            report.resolved().len(),
            plan.entry_points.len()
        );

        Ok(BootstrapOutcome { report, plan })
    }
}
