//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::schema::SchemaValidator;
use crate::types::{BrokkrConfigFile, ModulesConfig, DEFAULT_CAPABILITY};
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["brokkr.yaml", "brokkr.yml"];

/// Loaded and validated Brokkr configuration
#[derive(Debug, Clone)]
pub struct BrokkrConfig {
    /// The parsed configuration
    pub config: BrokkrConfigFile,

    /// Path to the configuration file
    pub config_path: Utf8PathBuf,

    /// Directory relative paths are resolved against
    pub working_dir: Utf8PathBuf,
}

impl BrokkrConfig {
    /// Load configuration from the specified path or search for it
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = Self::read(path)?;
        let config: BrokkrConfigFile = serde_yaml_ng::from_str(&content)?;
        Self::finish(config, config_path)
    }

    /// Load and validate configuration
    pub fn load_and_validate(path: Option<&Utf8Path>, validator: &SchemaValidator) -> Result<Self> {
        let (config_path, content) = Self::read(path)?;

        // Validate against schema first
        validator.validate_yaml(&content, "brokkr")?;

        let config: BrokkrConfigFile = serde_yaml_ng::from_str(&content)?;
        Self::finish(config, config_path)
    }

    /// Build a configuration in memory, rooted at `working_dir`
    pub fn from_parts(config: BrokkrConfigFile, working_dir: impl Into<Utf8PathBuf>) -> Self {
        let working_dir = working_dir.into();
        Self {
            config,
            config_path: working_dir.join(CONFIG_FILE_NAMES[0]),
            working_dir,
        }
    }

    /// Configuration for a module root with every other setting defaulted
    pub fn for_module_root(module_root: impl Into<Utf8PathBuf>) -> Self {
        let module_root = module_root.into();
        let config = BrokkrConfigFile {
            version: "1.0".to_string(),
            modules: ModulesConfig {
                path: module_root.to_string(),
                registry: None,
                store: None,
                capability: None,
            },
        };
        Self::from_parts(config, module_root)
    }

    fn read(path: Option<&Utf8Path>) -> Result<(Utf8PathBuf, String)> {
        match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.as_str())
                    } else {
                        Error::Io(e)
                    }
                })?;
                Ok((p.to_owned(), content))
            }
            None => Self::find_config(),
        }
    }

    fn finish(config: BrokkrConfigFile, config_path: Utf8PathBuf) -> Result<Self> {
        let working_dir = config_path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .map(|p| p.to_owned())
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        let mut loaded = Self {
            config,
            config_path,
            working_dir,
        };
        loaded.apply_env_overrides()?;

        debug!(
            "Loaded configuration from {} (module root: {})",
            loaded.config_path,
            loaded.module_root()
        );

        Ok(loaded)
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "brokkr.yaml (searched current and parent directories)",
        ))
    }

    /// Apply `BROKKR_*` environment overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        let modules = &mut self.config.modules;

        if let Ok(val) = env::var("BROKKR_MODULE_PATH") {
            if val.trim().is_empty() {
                return Err(Error::invalid_config("BROKKR_MODULE_PATH must not be empty"));
            }
            modules.path = val;
        }

        if let Ok(val) = env::var("BROKKR_REGISTRY") {
            modules.registry = Some(val);
        }

        if let Ok(val) = env::var("BROKKR_STORE") {
            modules.store = Some(val);
        }

        if let Ok(val) = env::var("BROKKR_CAPABILITY") {
            modules.capability = Some(val);
        }

        Ok(())
    }

    fn resolve(&self, path: &str) -> Utf8PathBuf {
        let path = Utf8Path::new(path);
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Get the inner configuration file
    pub fn inner(&self) -> &BrokkrConfigFile {
        &self.config
    }

    /// Module root; the runtime directory lives below it
    pub fn module_root(&self) -> Utf8PathBuf {
        self.resolve(&self.config.modules.path)
    }

    /// Registry file
    pub fn registry_path(&self) -> Utf8PathBuf {
        match &self.config.modules.registry {
            Some(path) => self.resolve(path),
            None => self.module_root().join("registry.yaml"),
        }
    }

    /// Artifact store root
    pub fn store_root(&self) -> Utf8PathBuf {
        match &self.config.modules.store {
            Some(path) => self.resolve(path),
            None => self.module_root().join("store"),
        }
    }

    /// Capability name entry points are declared under
    pub fn capability(&self) -> &str {
        self.config
            .modules
            .capability
            .as_deref()
            .unwrap_or(DEFAULT_CAPABILITY)
    }
}
