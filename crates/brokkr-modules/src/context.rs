//! Per-pass resolution state
//!
//! A [`ResolutionContext`] is created empty at the start of a pass and
//! dropped at its end. Its caches only ever grow while the pass runs.

use crate::error::ResolutionError;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Identity of a module while it is being resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    pub id: String,
    pub name: String,
}

impl ModuleRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<&brokkr_core::types::ModuleRecord> for ModuleRef {
    fn from(record: &brokkr_core::types::ModuleRecord) -> Self {
        Self::new(&record.id, &record.name)
    }
}

/// An artifact written to the runtime location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Module name the artifact belongs to
    pub module: String,
    pub path: PathBuf,
    pub bytes: u64,
    /// Hex-encoded SHA-256 of the written content
    pub sha256: String,
}

/// Entry point together with the module that contributed it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Contribution {
    module_id: String,
    identifier: String,
}

/// State shared by every validator call of one resolution pass
#[derive(Debug, Default)]
pub struct ResolutionContext {
    validated_artifacts: HashSet<String>,
    validated_closures: HashSet<String>,
    entry_points: Vec<Contribution>,
    visiting: Vec<ModuleRef>,
    warnings: Vec<ResolutionError>,
    extractions: Vec<Extraction>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_artifact_validated(&self, artifact_name: &str) -> bool {
        self.validated_artifacts.contains(artifact_name)
    }

    pub fn mark_artifact_validated(&mut self, artifact_name: &str) {
        self.validated_artifacts.insert(artifact_name.to_string());
    }

    pub fn is_closure_validated(&self, module_name: &str) -> bool {
        self.validated_closures.contains(module_name)
    }

    pub fn mark_closure_validated(&mut self, module_name: &str) {
        self.validated_closures.insert(module_name.to_string());
    }

    /// Push `module` on the visiting stack
    ///
    /// Fails with [`ResolutionError::CyclicDependency`] when the module is
    /// already being visited; the error carries the names along the cycle,
    /// starting and ending with the repeated module. Every successful call
    /// must be paired with [`leave`](Self::leave).
    pub fn enter(&mut self, module: &ModuleRef) -> Result<(), ResolutionError> {
        if let Some(pos) = self.visiting.iter().position(|m| m.id == module.id) {
            let mut cycle: Vec<String> = self.visiting[pos..]
                .iter()
                .map(|m| m.name.clone())
                .collect();
            cycle.push(module.name.clone());
            debug!(module = %module.name, "Dependency cycle: {}", cycle.join(" -> "));
            return Err(ResolutionError::CyclicDependency { cycle });
        }

        self.visiting.push(module.clone());
        Ok(())
    }

    /// Pop `module_id` from the visiting stack
    pub fn leave(&mut self, module_id: &str) {
        if let Some(pos) = self.visiting.iter().rposition(|m| m.id == module_id) {
            self.visiting.remove(pos);
        }
    }

    pub fn is_visiting(&self, module_id: &str) -> bool {
        self.visiting.iter().any(|m| m.id == module_id)
    }

    /// Append an entry point contributed by `module_id`
    pub fn record_entry_point(&mut self, module_id: &str, identifier: &str) {
        self.entry_points.push(Contribution {
            module_id: module_id.to_string(),
            identifier: identifier.to_string(),
        });
    }

    /// Remove every entry point contributed by `module_id`
    ///
    /// Returns the removed identifiers in discovery order. Entry points of
    /// other modules are kept, whatever their names.
    pub fn purge_contributions(&mut self, module_id: &str) -> Vec<String> {
        let mut purged = Vec::new();
        self.entry_points.retain(|c| {
            if c.module_id == module_id {
                purged.push(c.identifier.clone());
                false
            } else {
                true
            }
        });
        purged
    }

    /// Entry points contributed by `module_id`
    pub fn contributions(&self, module_id: &str) -> Vec<&str> {
        self.entry_points
            .iter()
            .filter(|c| c.module_id == module_id)
            .map(|c| c.identifier.as_str())
            .collect()
    }

    /// All accumulated entry points in discovery order
    pub fn entry_points(&self) -> Vec<&str> {
        self.entry_points
            .iter()
            .map(|c| c.identifier.as_str())
            .collect()
    }

    /// Entry points to hand to the host, deduplicated in discovery order
    pub fn activatable_entry_points(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entry_points
            .iter()
            .filter(|c| seen.insert(c.identifier.as_str()))
            .map(|c| c.identifier.clone())
            .collect()
    }

    pub fn warn(&mut self, warning: ResolutionError) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[ResolutionError] {
        &self.warnings
    }

    pub fn record_extraction(&mut self, extraction: Extraction) {
        self.extractions.push(extraction);
    }

    pub fn extractions(&self) -> &[Extraction] {
        &self.extractions
    }

    /// Split the context into its reportable parts
    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<ResolutionError>, Vec<Extraction>) {
        let entry_points = self.activatable_entry_points();
        (entry_points, self.warnings, self.extractions)
    }
}
