//! Pack command

use anyhow::{bail, Result};
use brokkr_core::types::MANIFEST_FILENAME;
use brokkr_modules::{ArtifactPacker, ManifestValidator, ServiceDescriptorScanner};

use crate::cli::PackArgs;
use crate::output;

pub fn run(args: PackArgs) -> Result<()> {
    let dir = args.dir.as_std_path();

    let manifest_path = dir.join(MANIFEST_FILENAME);
    if !manifest_path.is_file() {
        bail!("{} has no {}", args.dir, MANIFEST_FILENAME);
    }

    let manifests = ManifestValidator::new()?;
    let manifest = manifests
        .validate_file(&manifest_path)
        .map_err(|e| anyhow::anyhow!("Invalid {}: {}", MANIFEST_FILENAME, e))?;

    let descriptor = ServiceDescriptorScanner::descriptor_path(&args.capability);
    if !dir.join(&descriptor).is_file() {
        output::warning(&format!(
            "{} not found, the artifact will have no entry point",
            descriptor
        ));
    }

    let packer = ArtifactPacker::from_dir(dir)?;
    let files = packer.len();
    let bytes = packer.write_to(args.output.as_std_path())?;

    output::success(&format!(
        "Packed {} {} ({} files, {} bytes) into {}",
        manifest.name.as_deref().unwrap_or("module"),
        manifest.version.as_deref().unwrap_or(""),
        files,
        bytes,
        args.output
    ));

    Ok(())
}
