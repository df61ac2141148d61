//! Entry-point discovery inside a loadable unit

use crate::unit::LoadableUnit;

/// Directory holding capability descriptors inside an artifact
pub const SERVICES_DIR: &str = "META-INF/services";

/// Finds the entry points a unit declares for a capability
pub trait EntryPointScanner: Send + Sync {
    /// Fully-qualified entry-point identifiers, in the order the unit lists
    /// them
    ///
    /// When `base_package` is set, only identifiers inside that package are
    /// returned.
    fn scan(&self, unit: &LoadableUnit, capability: &str, base_package: Option<&str>)
        -> Vec<String>;
}

/// Reads `META-INF/services/<capability>`
///
/// The descriptor lists one identifier per line. Text after `#` is a comment;
/// blank lines are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceDescriptorScanner;

impl ServiceDescriptorScanner {
    pub fn descriptor_path(capability: &str) -> String {
        format!("{}/{}", SERVICES_DIR, capability)
    }

    fn parse(descriptor: &str, base_package: Option<&str>) -> Vec<String> {
        let prefix = base_package
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}.", p.trim_end_matches('.')));

        descriptor
            .lines()
            .map(|line| line.split('#').next().unwrap_or("").trim())
            .filter(|line| !line.is_empty())
            .filter(|line| prefix.as_deref().is_none_or(|p| line.starts_with(p)))
            .map(str::to_string)
            .collect()
    }
}

impl EntryPointScanner for ServiceDescriptorScanner {
    fn scan(
        &self,
        unit: &LoadableUnit,
        capability: &str,
        base_package: Option<&str>,
    ) -> Vec<String> {
        match unit.read(&Self::descriptor_path(capability)) {
            Some(bytes) => Self::parse(&String::from_utf8_lossy(bytes), base_package),
            None => Vec::new(),
        }
    }
}
