//! In-process registry and artifact store
//!
//! Used when a host keeps its module records elsewhere and by tests.

use crate::registry::ModuleRegistry;
use crate::store::ArtifactStore;
use anyhow::{anyhow, bail, Result};
use brokkr_core::types::{InstalledModule, ModuleArtifact, ModuleRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Module registry held in memory
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    modules: Mutex<Vec<MemoryModule>>,
    resets: AtomicUsize,
}

#[derive(Debug, Clone)]
struct MemoryModule {
    record: ModuleRecord,
    base_package: Option<String>,
    content: Option<Vec<u8>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module whose binary lives in the artifact store
    pub fn insert(&self, record: ModuleRecord, base_package: Option<String>) -> Result<()> {
        self.push(MemoryModule {
            record,
            base_package,
            content: None,
        })
    }

    /// Add a module carrying its binary inline
    pub fn insert_with_content(
        &self,
        record: ModuleRecord,
        base_package: Option<String>,
        content: Vec<u8>,
    ) -> Result<()> {
        self.push(MemoryModule {
            record,
            base_package,
            content: Some(content),
        })
    }

    /// Snapshot of every record, in insertion order
    pub fn records(&self) -> Result<Vec<ModuleRecord>> {
        self.with_modules(|modules| modules.iter().map(|m| m.record.clone()).collect())
    }

    /// How many times started flags were reset
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    fn push(&self, module: MemoryModule) -> Result<()> {
        self.with_modules(|modules| modules.push(module))
    }

    fn with_modules<T>(&self, f: impl FnOnce(&mut Vec<MemoryModule>) -> T) -> Result<T> {
        let mut modules = self
            .modules
            .lock()
            .map_err(|_| anyhow!("Module registry state is poisoned"))?;
        Ok(f(&mut modules))
    }
}

impl ModuleRegistry for MemoryRegistry {
    fn list_active_modules(&self) -> Result<Vec<ModuleRecord>> {
        self.with_modules(|modules| {
            modules
                .iter()
                .filter(|m| m.record.active && !m.record.uninstalled)
                .map(|m| m.record.clone())
                .collect()
        })
    }

    fn find_by_name(&self, name: &str) -> Result<Option<InstalledModule>> {
        self.with_modules(|modules| {
            modules
                .iter()
                .find(|m| m.record.name == name && !m.record.uninstalled)
                .map(|m| InstalledModule {
                    id: m.record.id.clone(),
                    name: m.record.name.clone(),
                    installed_version: m.record.version.clone(),
                    active: m.record.active,
                })
        })
    }

    fn find_artifact(&self, id: &str) -> Result<Option<ModuleArtifact>> {
        self.with_modules(|modules| {
            modules
                .iter()
                .find(|m| m.record.id == id)
                .map(|m| ModuleArtifact {
                    name: m.record.name.clone(),
                    base_package: m.base_package.clone(),
                    artifact_ref: m.record.artifact_ref.clone(),
                    content: m.content.clone(),
                })
        })
    }

    fn reset_started_flags(&self) -> Result<()> {
        self.with_modules(|modules| {
            for m in modules.iter_mut() {
                m.record.started = false;
            }
        })?;
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Artifact store held in memory, counting fetches
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
    fetches: Mutex<Vec<String>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, artifact_ref: impl Into<String>, content: Vec<u8>) -> Result<()> {
        self.artifacts
            .lock()
            .map_err(|_| anyhow!("Artifact store state is poisoned"))?
            .insert(artifact_ref.into(), content);
        Ok(())
    }

    /// Total number of fetches
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().map(|f| f.len()).unwrap_or_default()
    }

    /// Number of fetches of `artifact_ref`
    pub fn fetches_of(&self, artifact_ref: &str) -> usize {
        self.fetches
            .lock()
            .map(|f| f.iter().filter(|r| *r == artifact_ref).count())
            .unwrap_or_default()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn fetch_binary(&self, artifact_ref: &str) -> Result<Vec<u8>> {
        self.fetches
            .lock()
            .map_err(|_| anyhow!("Artifact store state is poisoned"))?
            .push(artifact_ref.to_string());

        let artifacts = self
            .artifacts
            .lock()
            .map_err(|_| anyhow!("Artifact store state is poisoned"))?;
        match artifacts.get(artifact_ref) {
            Some(content) => Ok(content.clone()),
            None => bail!("Artifact {} not found in store", artifact_ref),
        }
    }
}
