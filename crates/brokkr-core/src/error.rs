//! Error types for brokkr-core

use thiserror::Error;

/// Result type alias using brokkr-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Brokkr
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Schema validation error
    #[error("Schema validation failed:\n{errors}")]
    SchemaValidation { errors: String },

    /// Schema not found
    #[error("Schema not found: {name}")]
    SchemaNotFound { name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid semver version
    #[error("Invalid version format: {version}")]
    InvalidVersion { version: String },

    /// Invalid version range
    #[error("Invalid version range '{range}': {message}")]
    InvalidVersionRange { range: String, message: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a schema validation error from a list of errors
    pub fn schema_validation(errors: Vec<String>) -> Self {
        Self::SchemaValidation {
            errors: errors.join("\n"),
        }
    }

    /// Create a schema not found error
    pub fn schema_not_found(name: impl Into<String>) -> Self {
        Self::SchemaNotFound { name: name.into() }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create an invalid version range error
    pub fn invalid_version_range(range: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidVersionRange {
            range: range.into(),
            message: message.into(),
        }
    }
}
