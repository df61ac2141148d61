//! Resolution failures
//!
//! Every failure is local to one module: it excludes that module (and,
//! transitively, its dependents) from the resolved set and is reported, never
//! propagated as a hard error of the pass.

use serde::Serialize;
use thiserror::Error;

/// Why a module could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionError {
    /// The registry could not answer a query
    #[error("Registry lookup failed for {subject}: {message}")]
    RegistryLookupFailure { subject: String, message: String },

    /// No artifact metadata or binary content could be obtained
    #[error("Artifact of module {module} is unavailable: {reason}")]
    ArtifactUnavailable { module: String, reason: String },

    /// module.yml is missing or malformed
    #[error("Failed to parse manifest of {module}: {message}")]
    ManifestParseFailure { module: String, message: String },

    /// module.yml parsed but violates the manifest schema
    #[error("Manifest of {module} failed schema validation:\n{}", .errors.join("\n"))]
    SchemaValidationFailure { module: String, errors: Vec<String> },

    /// The artifact declares no entry point for the capability
    #[error("No entry point implementing {capability} found in artifact of {module}")]
    NoEntryPointFound { module: String, capability: String },

    /// The artifact declares several entry points; the first one was taken
    #[error("Artifact of {module} declares {} entry points; using {chosen}, ignoring {}", .ignored.len() + 1, .ignored.join(", "))]
    MultipleEntryPointsAmbiguity {
        module: String,
        chosen: String,
        ignored: Vec<String>,
    },

    /// The installed version of a dependency is outside the declared range
    #[error("{module} requires {dependency} {required}, but {installed} is installed")]
    VersionConstraintUnsatisfied {
        module: String,
        dependency: String,
        required: String,
        installed: String,
    },

    /// A dependency is installed but not active
    #[error("{module} requires {dependency}, which is not active")]
    DependencyInactive { module: String, dependency: String },

    /// No installed module carries the dependency's name
    #[error("{module} requires {dependency}, which is not installed")]
    DependencyNotInstalled { module: String, dependency: String },

    /// A dependency exists but its own closure or artifact failed
    #[error("{module} requires {dependency}, which could not be resolved: {cause}")]
    DependencyUnresolved {
        module: String,
        dependency: String,
        cause: Box<ResolutionError>,
    },

    /// Module participates in a dependency cycle
    #[error("Cyclic dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Writing the artifact to the runtime location failed
    #[error("Failed to extract artifact of {module} to {path}: {message}")]
    ExtractionFailure {
        module: String,
        path: String,
        message: String,
    },
}

impl ResolutionError {
    /// Walk through `DependencyUnresolved` wrappers to the originating failure
    pub fn root_cause(&self) -> &ResolutionError {
        match self {
            Self::DependencyUnresolved { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Whether this failure stems from a dependency cycle
    pub fn is_cyclic(&self) -> bool {
        matches!(self.root_cause(), Self::CyclicDependency { .. })
    }

    pub(crate) fn registry(subject: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::RegistryLookupFailure {
            subject: subject.into(),
            message: format!("{:#}", err),
        }
    }

    pub(crate) fn unavailable(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArtifactUnavailable {
            module: module.into(),
            reason: reason.into(),
        }
    }
}
