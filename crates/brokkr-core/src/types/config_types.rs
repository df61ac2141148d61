//! Configuration file types (brokkr.yaml)

use serde::{Deserialize, Serialize};

/// Capability entry points are declared under when the config does not name one
pub const DEFAULT_CAPABILITY: &str = "brokkr.ModuleEntryPoint";

/// Root of brokkr.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokkrConfigFile {
    /// Configuration format version
    pub version: String,

    /// Module resolution settings
    pub modules: ModulesConfig,
}

/// Where modules, the registry and the artifact store live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// Module root; validated artifacts are extracted below `<path>/runtime`
    pub path: String,

    /// Registry file, defaults to `<path>/registry.yaml`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Artifact store root, defaults to `<path>/store`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,

    /// Capability entry points are declared under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
}
