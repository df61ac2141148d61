//! Inspect command

use anyhow::{Context, Result};
use brokkr_modules::{ArtifactInspection, ManifestValidator, ServiceDescriptorScanner};

use crate::cli::InspectArgs;
use crate::output;

pub fn run(args: InspectArgs) -> Result<()> {
    let content = std::fs::read(&args.artifact)
        .with_context(|| format!("Failed to read {}", args.artifact))?;

    let manifests = ManifestValidator::new()?;
    let inspection = ArtifactInspection::inspect(
        &content,
        &args.capability,
        &ServiceDescriptorScanner,
        &manifests,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    output::header(&format!("Artifact {}", args.artifact));
    output::kv("SHA-256", &inspection.sha256);
    output::kv("Files", &inspection.files.len().to_string());

    if let Some(manifest) = &inspection.manifest {
        output::kv("Name", manifest.name.as_deref().unwrap_or("-"));
        output::kv("Version", manifest.version.as_deref().unwrap_or("-"));
        if let Some(base_package) = &manifest.base_package {
            output::kv("Base package", base_package);
        }
    }

    output::header(&format!("Entry points ({})", args.capability));
    if inspection.entry_points.is_empty() {
        output::warning("No entry point declared");
    }
    for entry_point in &inspection.entry_points {
        println!("  {}", entry_point);
    }
    if inspection.entry_points.len() > 1 {
        output::warning("Multiple entry points declared, only the first is activated");
    }

    println!();
    match &inspection.manifest_error {
        Some(err) => output::error(err),
        None if inspection.is_valid() => output::success("Artifact is loadable"),
        None => {}
    }

    Ok(())
}
