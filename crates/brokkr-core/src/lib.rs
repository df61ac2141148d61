//! # brokkr-core
//!
//! Core library for Brokkr providing:
//! - Configuration file parsing (brokkr.yaml)
//! - JSON Schema validation for configuration and module manifests
//! - Version ranges for module dependencies
//! - Type definitions shared by the registry, the validators and the CLI

pub mod config;
pub mod error;
pub mod schema;
pub mod types;
pub mod version;

pub use config::BrokkrConfig;
pub use error::{Error, Result};
pub use schema::SchemaValidator;
pub use version::VersionRange;
