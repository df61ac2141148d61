//! Validate command

use anyhow::{bail, Result};
use brokkr_modules::{ManifestError, ManifestValidator};

use crate::cli::ValidateArgs;
use crate::output;

pub fn run(args: ValidateArgs) -> Result<()> {
    let validator = ManifestValidator::new()?;

    match validator.validate_file(args.manifest.as_std_path()) {
        Ok(manifest) => {
            output::success(&format!("{} is valid", args.manifest));
            if let Some(name) = &manifest.name {
                output::kv("Name", name);
            }
            if let Some(version) = &manifest.version {
                output::kv("Version", version);
            }
            for dep in &manifest.dependencies {
                output::kv(
                    "Depends on",
                    &format!(
                        "{} {}",
                        dep.name.as_deref().unwrap_or("?"),
                        dep.version.as_deref().unwrap_or("*")
                    ),
                );
            }
            Ok(())
        }
        Err(ManifestError::Invalid(errors)) => {
            for error in &errors {
                output::error(error);
            }
            bail!("{} failed validation with {} error(s)", args.manifest, errors.len())
        }
        Err(ManifestError::Parse(message)) => {
            bail!("Failed to parse {}: {}", args.manifest, message)
        }
    }
}
