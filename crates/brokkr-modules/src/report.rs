//! Outcome of a resolution pass

use crate::context::Extraction;
use crate::error::ResolutionError;
use brokkr_core::types::ModuleRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to one candidate module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOutcome {
    pub module: ModuleRecord,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResolutionError>,
    /// Entry points removed because the module was rejected
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub purged_entry_points: Vec<String>,
}

impl ModuleOutcome {
    pub fn resolved(module: ModuleRecord) -> Self {
        Self {
            module,
            resolved: true,
            error: None,
            purged_entry_points: Vec::new(),
        }
    }

    pub fn rejected(module: ModuleRecord, error: ResolutionError, purged: Vec<String>) -> Self {
        Self {
            module,
            resolved: false,
            error: Some(error),
            purged_entry_points: purged,
        }
    }
}

/// Report of a resolution pass
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One outcome per candidate, in registry order
    pub outcomes: Vec<ModuleOutcome>,
    /// Failures of the pass itself (registry listing, started-flag reset)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResolutionError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ResolutionError>,
    /// Entry points to activate, deduplicated in discovery order
    pub entry_points: Vec<String>,
    pub extractions: Vec<Extraction>,
}

impl ResolutionReport {
    /// Resolved modules in registry order
    pub fn resolved(&self) -> Vec<&ModuleRecord> {
        self.outcomes
            .iter()
            .filter(|o| o.resolved)
            .map(|o| &o.module)
            .collect()
    }

    pub fn resolved_names(&self) -> Vec<&str> {
        self.resolved().into_iter().map(|m| m.name.as_str()).collect()
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ModuleOutcome> {
        self.outcomes.iter().filter(|o| !o.resolved)
    }

    /// Outcome of the module called `name`
    pub fn outcome(&self, name: &str) -> Option<&ModuleOutcome> {
        self.outcomes.iter().find(|o| o.module.name == name)
    }

    /// True when every candidate resolved and the pass had no errors
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.outcomes.iter().all(|o| o.resolved)
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
