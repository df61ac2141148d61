//! Module registry: the persistent record of installed modules

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use brokkr_core::types::{InstalledModule, ModuleArtifact, ModuleRecord};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Queries the resolution engine makes against the module registry
pub trait ModuleRegistry {
    /// Active, not uninstalled modules in registry order
    fn list_active_modules(&self) -> Result<Vec<ModuleRecord>>;

    /// The installed (not uninstalled) module called `name`
    fn find_by_name(&self, name: &str) -> Result<Option<InstalledModule>>;

    /// Artifact metadata of the module with registry identity `id`
    fn find_artifact(&self, id: &str) -> Result<Option<ModuleArtifact>>;

    /// Clear the started flag of every module
    fn reset_started_flags(&self) -> Result<()>;
}

/// One module in registry.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    #[serde(flatten)]
    pub record: ModuleRecord,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_package: Option<String>,

    /// Artifact binary, base64 encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl RegistryEntry {
    pub fn new(record: ModuleRecord) -> Self {
        Self {
            record,
            base_package: None,
            data: None,
        }
    }

    pub fn with_base_package(mut self, base_package: impl Into<String>) -> Self {
        self.base_package = Some(base_package.into());
        self
    }

    pub fn with_content(mut self, content: &[u8]) -> Self {
        self.data = Some(STANDARD.encode(content));
        self
    }

    fn installed(&self) -> InstalledModule {
        InstalledModule {
            id: self.record.id.clone(),
            name: self.record.name.clone(),
            installed_version: self.record.version.clone(),
            active: self.record.active,
        }
    }

    fn artifact(&self) -> Result<ModuleArtifact> {
        let content = match &self.data {
            Some(data) => Some(STANDARD.decode(data.trim()).with_context(|| {
                format!("Inline artifact of {} is not valid base64", self.record.name)
            })?),
            None => None,
        };

        Ok(ModuleArtifact {
            name: self.record.name.clone(),
            base_package: self.base_package.clone(),
            artifact_ref: self.record.artifact_ref.clone(),
            content,
        })
    }
}

/// Document layout of registry.yaml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub modules: Vec<RegistryEntry>,
}

/// Registry backed by a YAML file
///
/// The file is read once when the registry is opened. Resetting started
/// flags rewrites it under an exclusive file lock.
#[derive(Debug)]
pub struct FileModuleRegistry {
    path: PathBuf,
    document: Mutex<RegistryDocument>,
}

impl FileModuleRegistry {
    /// Open the registry file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read module registry {}", path.display()))?;
        let document: RegistryDocument = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse module registry {}", path.display()))?;

        info!(
            "Loaded {} module(s) from registry {}",
            document.modules.len(),
            path.display()
        );

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Write `document` to `path`, replacing what is there
    pub fn create(path: impl Into<PathBuf>, document: RegistryDocument) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        write_locked(&path, &document)?;
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the registry contents
    pub fn document(&self) -> Result<RegistryDocument> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryDocument>> {
        self.document
            .lock()
            .map_err(|_| anyhow!("Module registry state is poisoned"))
    }
}

impl ModuleRegistry for FileModuleRegistry {
    fn list_active_modules(&self) -> Result<Vec<ModuleRecord>> {
        Ok(self
            .lock()?
            .modules
            .iter()
            .filter(|e| e.record.active && !e.record.uninstalled)
            .map(|e| e.record.clone())
            .collect())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<InstalledModule>> {
        Ok(self
            .lock()?
            .modules
            .iter()
            .find(|e| e.record.name == name && !e.record.uninstalled)
            .map(RegistryEntry::installed))
    }

    fn find_artifact(&self, id: &str) -> Result<Option<ModuleArtifact>> {
        self.lock()?
            .modules
            .iter()
            .find(|e| e.record.id == id)
            .map(RegistryEntry::artifact)
            .transpose()
    }

    fn reset_started_flags(&self) -> Result<()> {
        let mut document = self.lock()?;
        let started = document.modules.iter().filter(|e| e.record.started).count();
        if started == 0 {
            debug!("No started flags to reset");
            return Ok(());
        }

        for entry in &mut document.modules {
            entry.record.started = false;
        }
        write_locked(&self.path, &document)?;

        debug!("Reset started flag of {} module(s)", started);
        Ok(())
    }
}

fn write_locked(path: &Path, document: &RegistryDocument) -> Result<()> {
    let yaml = serde_yaml_ng::to_string(document).context("Failed to serialize module registry")?;

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open module registry {}", path.display()))?;

    file.lock_exclusive()
        .context("Failed to acquire exclusive lock on module registry")?;

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write module registry {}", path.display()))?;
    file.flush()?;

    Ok(())
}
