//! # brokkr-modules
//!
//! Module resolution for Brokkr:
//! - Dependency closure checking with semantic version ranges
//! - Artifact validation (entry point and manifest) and extraction
//! - The resolution pipeline and its report
//! - Hand-off of the resolved set to the host runtime
//! - File-backed and in-memory registries and artifact stores

pub mod artifact;
pub mod bootstrap;
pub mod context;
pub mod dependency;
pub mod error;
pub mod layout;
pub mod loader;
pub mod manifest;
pub mod memory;
pub mod packer;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod store;
pub mod unit;

pub use artifact::{ArtifactInspection, ArtifactValidator};
pub use bootstrap::{Bootstrap, BootstrapOutcome, PassLock};
pub use context::{Extraction, ModuleRef, ResolutionContext};
pub use dependency::{DeclaredDependency, DependencyResolver};
pub use error::ResolutionError;
pub use layout::RuntimeLayout;
pub use loader::{HostRuntime, LoadPlan, LoaderBoundary, RecordingHost};
pub use manifest::{ManifestError, ManifestValidator};
pub use memory::{MemoryArtifactStore, MemoryRegistry};
pub use packer::ArtifactPacker;
pub use pipeline::ResolutionPipeline;
pub use registry::{FileModuleRegistry, ModuleRegistry, RegistryDocument, RegistryEntry};
pub use report::{ModuleOutcome, ResolutionReport};
pub use scanner::{EntryPointScanner, ServiceDescriptorScanner};
pub use store::{ArtifactStore, FsArtifactStore};
pub use unit::LoadableUnit;
